use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    audio::AudioManager,
    config::WorldConfig,
    input::InputState,
    render::Canvas,
    world::World,
};

/// Frame pump for hosts that own a winit event loop.
///
/// Feed it every `WindowEvent`, call [`Game::frame`] once per redraw, then
/// present [`Game::canvas`] with whatever the host uses for pixels. Update
/// and draw strictly alternate.
pub struct Game {
    world: World,
    input: InputState,
    canvas: Canvas,
    exit_requested: bool,
}

impl Game {
    /// Create a game, opening the default audio device when one exists.
    pub fn new(config: WorldConfig) -> Self {
        let audio = AudioManager::new(config.audio);
        Self::with_audio(config, audio)
    }

    pub fn with_audio(config: WorldConfig, audio: AudioManager) -> Self {
        let canvas = Canvas::new(config.width, config.height);
        Self {
            world: World::new(config, audio),
            input: InputState::new(),
            canvas,
            exit_requested: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Select the first level to play.
    pub fn start(&mut self, level: usize) {
        self.world.select_level(level);
    }

    /// Escape or a close request was seen.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if is_escape_pressed(event) {
                    self.exit_requested = true;
                }
                self.input.handle_key(event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_button(*button, *state)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.handle_cursor_moved(position.x, position.y)
            }
            WindowEvent::Resized(size) => {
                self.canvas = Canvas::new(size.width, size.height);
            }
            WindowEvent::CloseRequested => self.exit_requested = true,
            _ => {}
        }
    }

    /// Update the world, draw it, then close the input frame.
    pub fn frame(&mut self) -> &Canvas {
        self.world.update(&self.input);
        self.finish_frame()
    }

    /// Like [`Game::frame`] with an explicit delta in seconds.
    pub fn frame_with_delta(&mut self, delta: f64) -> &Canvas {
        self.world.update_with_delta(&self.input, delta);
        self.finish_frame()
    }

    fn finish_frame(&mut self) -> &Canvas {
        self.world.draw(&mut self.canvas);
        self.input.begin_frame();
        &self.canvas
    }
}

fn is_escape_pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use image::Rgba;
    use winit::dpi::PhysicalSize;
    use winit::event::MouseButton;

    use super::*;
    use crate::level::Level;
    use crate::shape::ShapeProps;

    fn game() -> Game {
        Game::with_audio(
            WorldConfig::default()
                .with_size(64, 48)
                .with_background(Rgba([10, 20, 30, 255])),
            AudioManager::default(),
        )
    }

    #[test]
    fn frame_updates_then_draws() {
        let mut game = game();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        game.world_mut().add_level(
            Level::new("one")
                .on_init(|world| {
                    world.spawn(
                        ShapeProps::rectangle(0.0, 0.0, 8.0, 8.0).with_background(Rgba([255, 255, 255, 255])),
                    );
                })
                .on_tick(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        );
        game.start(0);

        let canvas = game.frame_with_delta(1.0 / 60.0);
        assert_eq!(canvas.pixel(4, 4), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(canvas.pixel(40, 40), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn input_edges_close_with_the_frame() {
        let mut game = game();
        game.input_mut()
            .handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        game.frame_with_delta(1.0 / 60.0);
        assert!(game.world().is_mouse_down());
        assert!(!crate::input::InputSource::is_mouse_just_pressed(
            game.input(),
            MouseButton::Left
        ));
    }

    #[test]
    fn resize_replaces_canvas() {
        let mut game = game();
        game.handle_window_event(&WindowEvent::Resized(PhysicalSize::new(10, 5)));
        assert_eq!(crate::render::Surface::size(game.canvas()), (10, 5));

        game.handle_window_event(&WindowEvent::CloseRequested);
        assert!(game.exit_requested());
    }
}
