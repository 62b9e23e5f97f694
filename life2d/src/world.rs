//! The world: shape registry, physics, levels and the per-frame pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::audio::{AudioError, AudioManager};
use crate::config::WorldConfig;
use crate::contact::{CollisionRecord, ContactListener};
use crate::events::{Event, EventEmitter, EventKind, ListenerId};
use crate::input::InputSource;
use crate::level::{Level, LoopData, RenderFn, TickFn, TileFn};
use crate::math::Vector2;
use crate::physics::PhysicsWorld;
use crate::registry::SharedRegistry;
use crate::render::Surface;
use crate::shape::{CollisionHook, Shape, ShapeId, ShapeMut, ShapeProps, ShapeType, BORDER_TAG};
use crate::units::pixels_to_meters;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`World`], recorded on every shape it registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

/// Global mouse hook: `(world, cursor position)`.
pub type MouseHook = Arc<dyn Fn(&mut World, Vector2) + Send + Sync>;

pub struct World {
    id: WorldId,
    config: WorldConfig,
    physics: PhysicsWorld,
    registry: SharedRegistry,
    collision_tx: Sender<CollisionRecord>,
    collision_rx: Receiver<CollisionRecord>,

    levels: Vec<Level>,
    current_level: Option<usize>,
    pending_level: Option<usize>,
    tick_fn: TickFn,
    render_fn: RenderFn,

    events: EventEmitter,
    mouse_down_hooks: Vec<MouseHook>,
    mouse_up_hooks: Vec<MouseHook>,
    cursor: Vector2,
    mouse_is_down: bool,
    keys: RwLock<HashMap<KeyCode, bool>>,

    audio: AudioManager,
    last_update: Option<Instant>,
    elapsed: f64,
    frame: u64,
}

impl World {
    pub fn new(config: WorldConfig, audio: AudioManager) -> Self {
        let gravity = Vector2::new(
            pixels_to_meters(config.gravity.x),
            pixels_to_meters(config.gravity.y),
        );
        let (collision_tx, collision_rx) = crossbeam_channel::unbounded();
        let id = WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed));
        log::info!(
            "world {} created: {}x{} \"{}\"",
            id.0,
            config.width,
            config.height,
            config.title
        );

        Self {
            id,
            config,
            physics: PhysicsWorld::new(gravity),
            registry: SharedRegistry::default(),
            collision_tx,
            collision_rx,
            levels: Vec::new(),
            current_level: None,
            pending_level: None,
            tick_fn: noop_tick(),
            render_fn: noop_render(),
            events: EventEmitter::new(),
            mouse_down_hooks: Vec::new(),
            mouse_up_hooks: Vec::new(),
            cursor: Vector2::ZERO,
            mouse_is_down: false,
            keys: RwLock::new(HashMap::new()),
            audio,
            last_update: None,
            elapsed: 0.0,
            frame: 0,
        }
    }

    // ------------------------------
    // Accessors
    // ------------------------------

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width as f64
    }

    pub fn height(&self) -> f64 {
        self.config.height as f64
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Gravity in pixels per second squared.
    pub fn set_gravity(&mut self, x: f64, y: f64) {
        self.config.gravity = Vector2::new(x, y);
        self.physics
            .set_gravity(Vector2::new(pixels_to_meters(x), pixels_to_meters(y)));
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    pub fn play_sound(&mut self, name: &str) -> Result<(), AudioError> {
        self.audio.play_sound(name)
    }

    pub fn play_music(&mut self, name: &str, looped: bool) -> Result<(), AudioError> {
        self.audio.play_music(name, looped)
    }

    /// Number of updates run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn pause(&mut self) {
        self.config.paused = true;
    }

    /// Resume updates; the first delta after resuming is the first-frame delta.
    pub fn resume(&mut self) {
        self.config.paused = false;
        self.last_update = None;
    }

    pub fn is_paused(&self) -> bool {
        self.config.paused
    }

    // ------------------------------
    // Registry
    // ------------------------------

    /// Take ownership of `shape` and create its physics body.
    ///
    /// Panics if the shape was registered before, or if it needs a box
    /// collider with a non-positive side.
    pub fn register(&mut self, mut shape: Shape) -> ShapeId {
        let desc = shape.body_desc();
        let body = self.physics.create_body(&desc);
        shape.attach(self.id, body);

        let id = shape.id().clone();
        log::trace!("register {id} ({}, tag {})", shape.name, shape.tag);
        self.registry.get_mut().push(shape);
        id
    }

    /// Build and register a shape in one go.
    pub fn spawn(&mut self, props: ShapeProps) -> ShapeId {
        self.register(Shape::new(props))
    }

    /// Destroy the shape's body and hand the shape back. Absent ids are a no-op.
    pub fn unregister(&mut self, id: &ShapeId) -> Option<Shape> {
        let registry = self.registry.get_mut();
        let mut shape = registry.remove(id)?;
        for other in registry.iter_mut() {
            other.finish_collide_with(id);
            other.allow_collision_with(id);
        }
        if let Some(body) = shape.detach() {
            self.physics.remove_body(body);
        }
        log::trace!("unregister {id}");
        Some(shape)
    }

    pub fn remove(&mut self, id: &ShapeId) -> Option<Shape> {
        self.unregister(id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.registry.read().contains(id)
    }

    pub fn shape_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Read access to one shape under the registry lock.
    pub fn with_shape<R>(&self, id: &ShapeId, f: impl FnOnce(&Shape) -> R) -> Option<R> {
        self.registry.read().get(id).map(f)
    }

    pub fn shape(&mut self, id: &ShapeId) -> Option<&Shape> {
        self.registry.get_mut().get(id)
    }

    /// Mutable access paired with the physics world, for body-backed mutators.
    pub fn shape_mut(&mut self, id: &ShapeId) -> Option<ShapeMut<'_>> {
        let shape = self.registry.get_mut().get_mut(id)?;
        Some(ShapeMut::new(shape, &mut self.physics))
    }

    /// Four fixed shapes tagged `border` lining the inside of the world.
    pub fn create_borders(&mut self) -> [ShapeId; 4] {
        let t = self.config.border_thickness;
        let (w, h) = (self.width(), self.height());
        let color = self.config.border_color();

        let border = |name: &str, x: f64, y: f64, width: f64, height: f64| {
            ShapeProps::rectangle(x, y, width, height)
                .with_name(name)
                .with_tag(BORDER_TAG)
                .with_background(color)
                .dynamic()
        };

        [
            self.spawn(border("borderTop", 0.0, 0.0, w, t)),
            self.spawn(border("borderBottom", 0.0, h - t, w, t)),
            self.spawn(border("borderLeft", 0.0, 0.0, t, h)),
            self.spawn(border("borderRight", w - t, 0.0, t, h)),
        ]
    }

    // ------------------------------
    // Queries
    // ------------------------------

    fn select(&self, mut pred: impl FnMut(&Shape) -> bool) -> Vec<ShapeId> {
        self.registry
            .read()
            .iter()
            .filter(|s| pred(s))
            .map(|s| s.id().clone())
            .collect()
    }

    /// Every shape id, in registration order.
    pub fn all_shapes(&self) -> Vec<ShapeId> {
        self.registry.read().ids()
    }

    pub fn shapes_by_tag(&self, tag: &str) -> Vec<ShapeId> {
        self.select(|s| s.tag == tag)
    }

    /// First shape registered under `name`.
    pub fn shape_by_name(&self, name: &str) -> Option<ShapeId> {
        self.registry
            .read()
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id().clone())
    }

    pub fn shapes_by_name(&self, name: &str) -> Vec<ShapeId> {
        self.select(|s| s.name == name)
    }

    pub fn shapes_by_type(&self, shape_type: ShapeType) -> Vec<ShapeId> {
        self.select(|s| s.shape_type() == shape_type)
    }

    /// Shapes whose bounding box contains the cursor.
    pub fn hovered_shapes(&self) -> Vec<ShapeId> {
        let cursor = self.cursor;
        self.select(|s| s.contains_point(cursor))
    }

    pub fn unhovered_shapes(&self) -> Vec<ShapeId> {
        let cursor = self.cursor;
        self.select(|s| !s.contains_point(cursor))
    }

    /// True once the shape's box lies entirely outside the world.
    pub fn is_out_of_map(&self, id: &ShapeId) -> bool {
        let (w, h) = (self.width(), self.height());
        self.with_shape(id, |s| {
            s.x() + s.width() < 0.0 || s.x() > w || s.y() + s.height() < 0.0 || s.y() > h
        })
        .unwrap_or(false)
    }

    /// Angle in degrees from `a`'s center to `b`'s center.
    pub fn angle_between(&self, a: &ShapeId, b: &ShapeId) -> Option<f64> {
        let registry = self.registry.read();
        let from = registry.get(a)?.center();
        let to = registry.get(b)?.center();
        Some((to.y - from.y).atan2(to.x - from.x).to_degrees())
    }

    // ------------------------------
    // Shape helpers needing the world
    // ------------------------------

    /// Move `id` to the middle of the world, optionally stopping it.
    pub fn center(&mut self, id: &ShapeId, reset_velocity: bool) {
        let (cx, cy) = (self.width() / 2.0, self.height() / 2.0);
        if let Some(mut shape) = self.shape_mut(id) {
            let (w, h) = (shape.width(), shape.height());
            shape.set_position(cx - w / 2.0, cy - h / 2.0);
            if reset_velocity {
                shape.set_velocity(0.0, 0.0);
            }
        }
    }

    pub fn center_x(&mut self, id: &ShapeId, reset_velocity: bool) {
        let cx = self.width() / 2.0;
        if let Some(mut shape) = self.shape_mut(id) {
            let w = shape.width();
            shape.set_x(cx - w / 2.0);
            if reset_velocity {
                shape.set_x_velocity(0.0);
            }
        }
    }

    pub fn center_y(&mut self, id: &ShapeId, reset_velocity: bool) {
        let cy = self.height() / 2.0;
        if let Some(mut shape) = self.shape_mut(id) {
            let h = shape.height();
            shape.set_y(cy - h / 2.0);
            if reset_velocity {
                shape.set_y_velocity(0.0);
            }
        }
    }

    /// Point `id`'s velocity at `target`'s current position.
    pub fn follow(&mut self, id: &ShapeId, target: &ShapeId) {
        let Some(goal) = self.with_shape(target, Shape::position) else {
            return;
        };
        if let Some(mut shape) = self.shape_mut(id) {
            shape.follow(goal);
        }
    }

    /// Stop collision notifications between `a` and `b`, both directions.
    pub fn not_collide_with(&mut self, a: &ShapeId, b: &ShapeId) {
        let registry = self.registry.get_mut();
        if let Some(shape) = registry.get_mut(a) {
            shape.suppress_collision_with(b);
        }
        if let Some(shape) = registry.get_mut(b) {
            shape.suppress_collision_with(a);
        }
    }

    pub fn restore_collision_with(&mut self, a: &ShapeId, b: &ShapeId) {
        let registry = self.registry.get_mut();
        if let Some(shape) = registry.get_mut(a) {
            shape.allow_collision_with(b);
        }
        if let Some(shape) = registry.get_mut(b) {
            shape.allow_collision_with(a);
        }
    }

    pub fn not_collide_with_tag(&mut self, id: &ShapeId, tag: &str) {
        for other in self.shapes_by_tag(tag) {
            if &other != id {
                self.not_collide_with(id, &other);
            }
        }
    }

    pub fn restore_collision_with_tag(&mut self, id: &ShapeId, tag: &str) {
        for other in self.shapes_by_tag(tag) {
            if &other != id {
                self.restore_collision_with(id, &other);
            }
        }
    }

    // ------------------------------
    // Events and input
    // ------------------------------

    /// Subscribe to world-level events (collisions, mouse, custom).
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn events_mut(&mut self) -> &mut EventEmitter {
        &mut self.events
    }

    pub fn emit(&mut self, event: &Event) {
        self.events.emit(event);
    }

    pub fn on_mouse_down<F>(&mut self, hook: F)
    where
        F: Fn(&mut World, Vector2) + Send + Sync + 'static,
    {
        self.mouse_down_hooks.push(Arc::new(hook));
    }

    pub fn on_mouse_up<F>(&mut self, hook: F)
    where
        F: Fn(&mut World, Vector2) + Send + Sync + 'static,
    {
        self.mouse_up_hooks.push(Arc::new(hook));
    }

    /// Cursor position as of the last update.
    pub fn cursor_position(&self) -> Vector2 {
        self.cursor
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_is_down
    }

    /// Whether `key` was held at the last update.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(&key).copied().unwrap_or(false)
    }

    // ------------------------------
    // Levels
    // ------------------------------

    /// Append a level; returns its index.
    pub fn add_level(&mut self, level: Level) -> usize {
        self.levels.push(level);
        self.levels.len() - 1
    }

    pub fn set_levels(&mut self, levels: Vec<Level>) {
        self.levels = levels;
        self.pending_level = None;
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn current_level(&self) -> Option<usize> {
        self.current_level
    }

    /// Level switch recorded for the next update, if any.
    pub fn pending_level(&self) -> Option<usize> {
        self.pending_level
    }

    /// Tear down every shape and start level `index` now. Out of range is a no-op.
    pub fn select_level(&mut self, index: usize) {
        if index >= self.levels.len() {
            log::debug!("select_level({index}) ignored: {} levels", self.levels.len());
            return;
        }

        if let Some(destroy) = self
            .current_level
            .and_then(|i| self.levels.get(i))
            .and_then(|l| l.on_destroy.clone())
        {
            destroy(self);
        }

        self.clear_shapes();
        self.pending_level = None;
        self.current_level = Some(index);

        let level = self.levels[index].clone();
        log::info!("level {index} \"{}\" selected", level.name);
        self.tick_fn = level.tick.clone().unwrap_or_else(noop_tick);
        self.render_fn = level.render.clone().unwrap_or_else(noop_render);

        if let Some(init) = &level.init {
            init(self);
        }
        if let Some(map) = &level.map {
            self.generate_level_from_map(map.as_slice(), &level.tiles);
        }
    }

    /// Switch to the following level on the next update; no-op on the last one.
    pub fn next_level(&mut self) {
        let next = self.current_level.map_or(0, |i| i + 1);
        if next < self.levels.len() {
            self.pending_level = Some(next);
        }
    }

    /// Switch to `index` on the next update; out of range is ignored.
    pub fn switch_to_level(&mut self, index: usize) {
        if index < self.levels.len() {
            self.pending_level = Some(index);
        }
    }

    /// Lay out a tile map over the whole world.
    ///
    /// Tiles are `width / columns` by `height / rows` pixels (integer
    /// division); columns come from the first row. Characters without a
    /// handler are skipped.
    pub fn generate_level_from_map<S: AsRef<str>>(&mut self, map: &[S], handlers: &HashMap<char, TileFn>) {
        let rows = map.len() as u32;
        let cols = map.first().map_or(0, |r| r.as_ref().chars().count()) as u32;
        if rows == 0 || cols == 0 {
            return;
        }
        if map.iter().any(|r| r.as_ref().chars().count() as u32 != cols) {
            log::warn!("tile map rows have uneven widths; using {cols} columns");
        }

        let tile_w = (self.config.width / cols) as f64;
        let tile_h = (self.config.height / rows) as f64;

        for (row, line) in map.iter().enumerate() {
            for (col, ch) in line.as_ref().chars().enumerate() {
                if let Some(handler) = handlers.get(&ch).cloned() {
                    let position = Vector2::new(col as f64 * tile_w, row as f64 * tile_h);
                    handler(self, position, tile_w, tile_h);
                }
            }
        }
    }

    fn clear_shapes(&mut self) {
        let shapes = self.registry.get_mut().drain();
        for mut shape in shapes {
            if let Some(body) = shape.detach() {
                self.physics.remove_body(body);
            }
        }
        // Records from the previous level refer to shapes that no longer exist.
        for stale in self.collision_rx.try_iter() {
            log::trace!("dropping stale collision record {stale:?}");
        }
    }

    // ------------------------------
    // Frame
    // ------------------------------

    /// Run one frame, timed by the wall clock (or the fixed timestep when
    /// configured).
    pub fn update(&mut self, input: &dyn InputSource) {
        if self.config.paused {
            return;
        }
        let now = Instant::now();
        let delta = match (self.config.fixed_timestep, self.last_update) {
            (Some(dt), _) => dt,
            (None, Some(last)) => now.duration_since(last).as_secs_f64(),
            (None, None) => self.config.first_frame_delta,
        };
        self.last_update = Some(now);
        self.run_frame(input, delta);
    }

    /// Run one frame advancing `delta` seconds.
    pub fn update_with_delta(&mut self, input: &dyn InputSource, delta: f64) {
        if self.config.paused {
            return;
        }
        self.run_frame(input, delta);
    }

    fn run_frame(&mut self, input: &dyn InputSource, delta: f64) {
        self.frame += 1;
        self.elapsed += delta;

        self.physics
            .step(delta, &ContactListener::new(&self.registry, &self.collision_tx));

        self.audio.update();

        self.drain_collisions();

        if let Some(index) = self.pending_level.take() {
            self.select_level(index);
            return;
        }

        self.sync_shapes();

        let tick = Arc::clone(&self.tick_fn);
        let data = LoopData {
            delta,
            elapsed: self.elapsed,
            frame: self.frame,
        };
        tick(self, &data);

        self.sample_input(input);
    }

    fn drain_collisions(&mut self) {
        let records: Vec<CollisionRecord> = self.collision_rx.try_iter().collect();
        if !records.is_empty() {
            log::debug!("draining {} collision records", records.len());
        }
        for record in records {
            match record {
                CollisionRecord::Begin(a, b) => self.begin_collision(a, b),
                CollisionRecord::End(a, b) => self.finish_collision(a, b),
            }
        }
    }

    /// Hooks for a pair both still registered and not opted out; `None`
    /// when the record should be dropped.
    fn pair_hooks(
        &mut self,
        a: &ShapeId,
        b: &ShapeId,
        finish: bool,
    ) -> Option<(Option<CollisionHook>, Option<CollisionHook>)> {
        let registry = self.registry.get_mut();
        let (sa, sb) = (registry.get(a)?, registry.get(b)?);
        if !sa.should_collide_with(b) || !sb.should_collide_with(a) {
            log::trace!("collision {a} <-> {b} suppressed");
            return None;
        }
        Some(if finish {
            (sa.finish_collision_hook(), sb.finish_collision_hook())
        } else {
            (sa.collision_hook(), sb.collision_hook())
        })
    }

    fn begin_collision(&mut self, a: ShapeId, b: ShapeId) {
        let Some((hook_a, hook_b)) = self.pair_hooks(&a, &b, false) else {
            return;
        };

        self.events.emit(&Event::Collision {
            a: a.clone(),
            b: b.clone(),
        });

        let registry = self.registry.get_mut();
        if let Some(shape) = registry.get_mut(&a) {
            shape.collide_with(&b);
        }
        if let Some(shape) = registry.get_mut(&b) {
            shape.collide_with(&a);
        }

        self.run_pair_hooks(&a, &b, hook_a, hook_b);
    }

    fn finish_collision(&mut self, a: ShapeId, b: ShapeId) {
        // The listener already removed the pair; repeating it is harmless and
        // covers a begin drained in this same batch.
        {
            let registry = self.registry.get_mut();
            if let Some(shape) = registry.get_mut(&a) {
                shape.finish_collide_with(&b);
            }
            if let Some(shape) = registry.get_mut(&b) {
                shape.finish_collide_with(&a);
            }
        }

        let Some((hook_a, hook_b)) = self.pair_hooks(&a, &b, true) else {
            return;
        };

        self.events.emit(&Event::FinishCollision {
            a: a.clone(),
            b: b.clone(),
        });

        self.run_pair_hooks(&a, &b, hook_a, hook_b);
    }

    fn run_pair_hooks(
        &mut self,
        a: &ShapeId,
        b: &ShapeId,
        hook_a: Option<CollisionHook>,
        hook_b: Option<CollisionHook>,
    ) {
        if let Some(hook) = hook_a {
            hook(self, a, b);
        }
        // The first hook may have removed `b`.
        if let Some(hook) = hook_b {
            if self.registry.get_mut().contains(b) {
                hook(self, b, a);
            }
        }
    }

    fn sync_shapes(&mut self) {
        let physics = &self.physics;
        for shape in self.registry.get_mut().iter_mut() {
            if let Some(event) = shape.update(physics) {
                shape.events_mut().emit(&event);
            }
        }
    }

    fn sample_input(&mut self, input: &dyn InputSource) {
        self.cursor = input.cursor_position();
        self.mouse_is_down = input.is_mouse_down(MouseButton::Left);
        {
            let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
            for held in keys.values_mut() {
                *held = false;
            }
            for key in input.keys_down() {
                keys.insert(key, true);
            }
        }

        if input.is_mouse_just_pressed(MouseButton::Left) {
            self.mouse_down(self.cursor);
        }
        if input.is_mouse_just_released(MouseButton::Left) {
            self.mouse_up(self.cursor);
        }
    }

    fn mouse_down(&mut self, position: Vector2) {
        let event = Event::MouseDown { position };
        for shape in self.registry.get_mut().iter_mut() {
            if shape.contains_point(position) && !shape.clicked {
                shape.clicked = true;
                shape.events_mut().emit(&event);
            }
        }
        self.events.emit(&event);

        for hook in self.mouse_down_hooks.clone() {
            hook(self, position);
        }
    }

    fn mouse_up(&mut self, position: Vector2) {
        let up = Event::MouseUp { position };
        let click = Event::Click { position };
        for shape in self.registry.get_mut().iter_mut() {
            if shape.contains_point(position) {
                shape.events_mut().emit(&up);
                if shape.clicked {
                    shape.events_mut().emit(&click);
                }
            }
            shape.clicked = false;
        }
        self.events.emit(&up);

        for hook in self.mouse_up_hooks.clone() {
            hook(self, position);
        }
    }

    // ------------------------------
    // Drawing
    // ------------------------------

    /// Draw order: borders first, then ascending z-index, ties by
    /// registration order.
    pub fn draw_order(&self) -> Vec<ShapeId> {
        let registry = self.registry.read();
        let mut order: Vec<(bool, i32, ShapeId)> = registry
            .iter()
            .map(|s| (!s.is_border(), s.z_index, s.id().clone()))
            .collect();
        order.sort_by_key(|(not_border, z, _)| (*not_border, *z));
        order.into_iter().map(|(_, _, id)| id).collect()
    }

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        surface.fill(self.config.background_color());

        let order = self.draw_order();
        let registry = self.registry.get_mut();
        for id in &order {
            if let Some(shape) = registry.get_mut(id) {
                shape.draw(surface);
            }
        }

        let render = Arc::clone(&self.render_fn);
        render(self, surface);
    }

    /// Remove every shape, stop audio and forget levels.
    pub fn destroy(&mut self) {
        let current = self.current_level.and_then(|i| self.levels.get(i));
        if let Some(destroy) = current.and_then(|l| l.on_destroy.clone()) {
            destroy(self);
        }
        self.clear_shapes();
        self.audio.cleanup();
        self.levels.clear();
        self.current_level = None;
        self.pending_level = None;
        self.tick_fn = noop_tick();
        self.render_fn = noop_render();
        log::info!("world {} destroyed", self.id.0);
    }
}

fn noop_tick() -> TickFn {
    Arc::new(|_, _| {})
}

fn noop_render() -> RenderFn {
    Arc::new(|_, _| {})
}
