use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::Rgba;
use life2d::{
    AudioManager, AxisX, AxisY, Canvas, Event, EventKind, InputState, KeyCode, Level, MouseButton,
    ShapeProps, Vector2, World, WorldConfig,
};
use winit::event::ElementState;

const DT: f64 = 1.0 / 60.0;

fn world_sized(width: u32, height: u32) -> World {
    World::new(
        WorldConfig::default().with_size(width, height),
        AudioManager::default(),
    )
}

#[test]
fn map_places_tiles_on_a_uniform_grid() {
    let mut world = world_sized(90, 90);
    let placed = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&placed);
    world.add_level(
        Level::new("grid")
            .with_map(&["#.#", ".#.", "#?#"])
            .with_tile('#', move |world, pos, w, h| {
                sink.lock().unwrap().push((pos, w, h));
                world.spawn(ShapeProps::rectangle(pos.x, pos.y, w, h).with_tag("wall"));
            }),
    );
    world.select_level(0);

    let placed = placed.lock().unwrap();
    let positions: Vec<Vector2> = placed.iter().map(|(p, _, _)| *p).collect();
    assert_eq!(
        positions,
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(60.0, 0.0),
            Vector2::new(30.0, 30.0),
            Vector2::new(0.0, 60.0),
            Vector2::new(60.0, 60.0),
        ]
    );
    assert!(placed.iter().all(|(_, w, h)| *w == 30.0 && *h == 30.0));
    assert_eq!(world.shapes_by_tag("wall").len(), 5);
}

#[test]
fn walled_room_puts_the_player_in_the_middle() {
    let mut world = world_sized(90, 90);
    let player = Arc::new(Mutex::new(Vec::new()));
    let walls = Arc::new(AtomicUsize::new(0));

    let seen = Arc::clone(&player);
    let count = Arc::clone(&walls);
    world.add_level(
        Level::new("room")
            .with_map(&["###", "#@#", "###"])
            .with_tile('#', move |_, _, _, _| {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .with_tile('@', move |_, pos, w, h| {
                seen.lock().unwrap().push((pos, w, h));
            }),
    );
    world.select_level(0);

    assert_eq!(walls.load(Ordering::SeqCst), 8);
    assert_eq!(
        *player.lock().unwrap(),
        vec![(Vector2::new(30.0, 30.0), 30.0, 30.0)]
    );
}

#[test]
fn tile_size_uses_integer_division() {
    let mut world = world_sized(100, 50);
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    let mut handlers = std::collections::HashMap::new();
    let handler: life2d::level::TileFn = Arc::new(move |_: &mut World, _: Vector2, w: f64, h: f64| {
        sink.lock().unwrap().push((w, h));
    });
    handlers.insert('x', handler);

    world.generate_level_from_map(&["xxx", "xxx", "xxx"], &handlers);
    let sizes = sizes.lock().unwrap();
    assert_eq!(sizes.len(), 9);
    assert_eq!(sizes[0], (33.0, 16.0));
}

#[test]
fn level_switch_waits_for_next_update() {
    let mut world = world_sized(200, 200);
    let first_ticks = Arc::new(AtomicUsize::new(0));
    let second_ticks = Arc::new(AtomicUsize::new(0));
    let second_inits = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));

    let ticks = Arc::clone(&first_ticks);
    let gone = Arc::clone(&destroyed);
    world.add_level(
        Level::new("first")
            .on_init(|world| {
                world.spawn(ShapeProps::rectangle(10.0, 10.0, 10.0, 10.0).with_name("old"));
            })
            .on_tick(move |world, _| {
                ticks.fetch_add(1, Ordering::SeqCst);
                world.next_level();
                assert_eq!(world.current_level(), Some(0));
                assert!(world.shape_by_name("old").is_some());
            })
            .on_destroy(move |_| {
                gone.fetch_add(1, Ordering::SeqCst);
            }),
    );
    let ticks = Arc::clone(&second_ticks);
    let inits = Arc::clone(&second_inits);
    world.add_level(
        Level::new("second")
            .on_init(move |_| {
                inits.fetch_add(1, Ordering::SeqCst);
            })
            .on_tick(move |_, _| {
                ticks.fetch_add(1, Ordering::SeqCst);
            }),
    );
    world.select_level(0);
    let input = InputState::new();

    world.update_with_delta(&input, DT);
    assert_eq!(world.current_level(), Some(0));
    assert_eq!(world.pending_level(), Some(1));
    assert_eq!(first_ticks.load(Ordering::SeqCst), 1);
    assert!(world.shape_by_name("old").is_some());
    assert_eq!(world.physics().body_count(), 1);

    // Switch applies after the collision drain; this frame's tick is skipped.
    world.update_with_delta(&input, DT);
    assert_eq!(world.current_level(), Some(1));
    assert_eq!(world.pending_level(), None);
    assert_eq!(second_inits.load(Ordering::SeqCst), 1);
    assert_eq!(second_ticks.load(Ordering::SeqCst), 0);
    assert_eq!(first_ticks.load(Ordering::SeqCst), 1);
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert!(world.shape_by_name("old").is_none());
    assert_eq!(world.physics().body_count(), 0);

    world.update_with_delta(&input, DT);
    assert_eq!(second_ticks.load(Ordering::SeqCst), 1);

    // Last level: no-op. Out of range: ignored.
    world.next_level();
    assert_eq!(world.pending_level(), None);
    world.switch_to_level(7);
    assert_eq!(world.pending_level(), None);
    world.select_level(7);
    assert_eq!(world.current_level(), Some(1));
}

#[test]
fn borders_draw_beneath_everything() {
    let blue = Rgba([0, 0, 255, 255]);
    let red = Rgba([255, 0, 0, 255]);
    let mut world = World::new(
        WorldConfig::default()
            .with_size(60, 40)
            .with_border(10.0, blue),
        AudioManager::default(),
    );
    let low = world.spawn(
        ShapeProps::rectangle(0.0, 0.0, 20.0, 20.0)
            .with_background(red)
            .with_z_index(-5),
    );
    let borders = world.create_borders();

    let order = world.draw_order();
    assert_eq!(&order[..4], &borders[..]);
    assert_eq!(order[4], low);

    let mut canvas = Canvas::new(60, 40);
    world.draw(&mut canvas);
    assert_eq!(canvas.pixel(5, 5), Some(red));
    assert_eq!(canvas.pixel(50, 35), Some(blue));
    assert_eq!(canvas.pixel(30, 25), Some(Rgba([0, 0, 0, 255])));
}

#[test]
fn z_index_orders_non_border_shapes() {
    let mut world = world_sized(100, 100);
    let top = world.spawn(ShapeProps::rectangle(0.0, 0.0, 10.0, 10.0).with_z_index(3));
    let bottom = world.spawn(ShapeProps::rectangle(0.0, 0.0, 10.0, 10.0).with_z_index(-1));
    let middle = world.spawn(ShapeProps::rectangle(0.0, 0.0, 10.0, 10.0));
    assert_eq!(world.draw_order(), vec![bottom, middle, top]);
}

#[test]
fn render_hook_draws_after_shapes() {
    let mut world = world_sized(20, 20);
    world.add_level(Level::new("hud").on_render(|world, surface| {
        surface.draw_text(&format!("frame {}", world.frame()), Vector2::new(1.0, 1.0), 8.0, life2d::render::WHITE);
    }));
    world.select_level(0);
    world.update_with_delta(&InputState::new(), DT);

    let mut canvas = Canvas::new(20, 20);
    world.draw(&mut canvas);
    assert_eq!(canvas.text_commands().len(), 1);
    assert_eq!(canvas.text_commands()[0].text, "frame 1");
}

#[test]
fn direction_change_reports_flips() {
    let mut world = world_sized(400, 400);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let id = world.spawn(ShapeProps::rectangle(200.0, 200.0, 10.0, 10.0).dynamic());

    let sink = Arc::clone(&seen);
    world.shape_mut(&id).unwrap().on(EventKind::DirectionChange, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    let input = InputState::new();
    world.shape_mut(&id).unwrap().set_velocity(50.0, 50.0);
    world.update_with_delta(&input, DT);
    world.update_with_delta(&input, DT);
    world.shape_mut(&id).unwrap().set_velocity(-50.0, 50.0);
    world.update_with_delta(&input, DT);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Event::DirectionChange {
                x: AxisX::Right,
                y: AxisY::Down
            },
            Event::DirectionChange {
                x: AxisX::Left,
                y: AxisY::Down
            },
        ]
    );
}

#[test]
fn physics_positions_flow_back_in_pixels() {
    let mut world = world_sized(400, 400);
    let id = world.spawn(ShapeProps::rectangle(100.0, 100.0, 16.0, 16.0).dynamic());
    world.shape_mut(&id).unwrap().set_velocity(60.0, 0.0);

    let input = InputState::new();
    for _ in 0..60 {
        world.update_with_delta(&input, DT);
    }

    let shape = world.shape(&id).unwrap();
    assert!((shape.x() - 160.0).abs() < 1.0, "x = {}", shape.x());
    assert!((shape.y() - 100.0).abs() < 1e-3);
    assert!((shape.velocity().x - 60.0).abs() < 1e-3);
}

#[test]
fn gravity_pulls_dynamic_shapes_down() {
    let mut world = World::new(
        WorldConfig::default().with_gravity(0.0, 80.0),
        AudioManager::default(),
    );
    let falling = world.spawn(ShapeProps::rectangle(100.0, 100.0, 16.0, 16.0).dynamic());
    let fixed = world.spawn(ShapeProps::rectangle(200.0, 100.0, 16.0, 16.0));

    let input = InputState::new();
    for _ in 0..30 {
        world.update_with_delta(&input, DT);
    }

    assert!(world.shape(&falling).unwrap().y() > 105.0);
    assert_eq!(world.shape(&fixed).unwrap().y(), 100.0);
}

#[test]
fn mouse_press_and_release_click_hovered_shapes() {
    let mut world = world_sized(100, 100);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let global = Arc::new(AtomicUsize::new(0));

    let button = world.spawn(ShapeProps::rectangle(10.0, 10.0, 20.0, 20.0));
    let other = world.spawn(ShapeProps::rectangle(60.0, 60.0, 20.0, 20.0));
    for kind in [EventKind::MouseDown, EventKind::MouseUp, EventKind::Click] {
        let sink = Arc::clone(&seen);
        world.shape_mut(&button).unwrap().on(kind, move |event| {
            sink.lock().unwrap().push(event.kind());
        });
    }
    let other_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&other_seen);
    world.shape_mut(&other).unwrap().on(EventKind::Click, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = Arc::clone(&global);
    world.on_mouse_down(move |_, pos| {
        assert_eq!(pos, Vector2::new(15.0, 15.0));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut input = InputState::new();
    input.handle_cursor_moved(15.0, 15.0);
    input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
    world.update_with_delta(&input, DT);
    assert!(world.shape(&button).unwrap().is_clicked());
    assert_eq!(world.hovered_shapes(), vec![button.clone()]);
    assert_eq!(world.unhovered_shapes(), vec![other.clone()]);

    input.begin_frame();
    world.update_with_delta(&input, DT);
    input.handle_mouse_button(MouseButton::Left, ElementState::Released);
    world.update_with_delta(&input, DT);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![EventKind::MouseDown, EventKind::MouseUp, EventKind::Click]
    );
    assert!(!world.shape(&button).unwrap().is_clicked());
    assert_eq!(global.load(Ordering::SeqCst), 1);
    assert_eq!(other_seen.load(Ordering::SeqCst), 0);
    assert_eq!(world.cursor_position(), Vector2::new(15.0, 15.0));
}

#[test]
fn key_table_tracks_held_keys() {
    let mut world = world_sized(100, 100);
    let mut input = InputState::new();

    input.press_key(KeyCode::Space);
    world.update_with_delta(&input, DT);
    assert!(world.is_key_pressed(KeyCode::Space));
    assert!(!world.is_key_pressed(KeyCode::KeyA));

    input.release_key(KeyCode::Space);
    input.begin_frame();
    world.update_with_delta(&input, DT);
    assert!(!world.is_key_pressed(KeyCode::Space));
}

#[test]
fn destroy_tears_everything_down() {
    let mut world = world_sized(100, 100);
    world.create_borders();
    world.add_level(Level::new("only"));
    world.destroy();
    assert_eq!(world.shape_count(), 0);
    assert_eq!(world.physics().body_count(), 0);
    assert_eq!(world.level_count(), 0);
}
