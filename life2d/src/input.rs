use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent, MouseButton},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::math::Vector2;

/// What the world samples once per update.
pub trait InputSource {
    /// Cursor position in surface pixels.
    fn cursor_position(&self) -> Vector2;

    fn is_mouse_down(&self, button: MouseButton) -> bool;

    /// Went down since the last frame boundary.
    fn is_mouse_just_pressed(&self, button: MouseButton) -> bool;

    /// Went up since the last frame boundary.
    fn is_mouse_just_released(&self, button: MouseButton) -> bool;

    /// Every key currently held.
    fn keys_down(&self) -> Vec<KeyCode>;
}

/// Tracks keyboard and mouse state across frames.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    mouse_x: f64,
    mouse_y: f64,
    mouse_down: [bool; 8],
    mouse_pressed: [bool; 8],
    mouse_released: [bool; 8],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame pressed/released flags.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.fill(false);
        self.mouse_released.fill(false);
    }

    /// Handle a keyboard input event from winit.
    pub fn handle_key(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(keycode) = event.physical_key {
            self.set_key(keycode, event.state);
        }
    }

    /// Handle a mouse button input event from winit.
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if let Some(idx) = mouse_button_index(button) {
            match state {
                ElementState::Pressed => {
                    if !self.mouse_down[idx] {
                        self.mouse_pressed[idx] = true;
                    }
                    self.mouse_down[idx] = true;
                }
                ElementState::Released => {
                    self.mouse_down[idx] = false;
                    self.mouse_released[idx] = true;
                }
            }
        }
    }

    /// Handle mouse cursor movement from winit.
    pub fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        self.mouse_x = x;
        self.mouse_y = y;
    }

    /// Synthetic key press, for hosts without a winit `KeyEvent` at hand.
    pub fn press_key(&mut self, key: KeyCode) {
        self.set_key(key, ElementState::Pressed);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.set_key(key, ElementState::Released);
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    fn set_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_down.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_down.insert(key);
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }
}

impl InputSource for InputState {
    fn cursor_position(&self) -> Vector2 {
        Vector2::new(self.mouse_x, self.mouse_y)
    }

    fn is_mouse_down(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_down[idx])
            .unwrap_or(false)
    }

    fn is_mouse_just_pressed(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_pressed[idx])
            .unwrap_or(false)
    }

    fn is_mouse_just_released(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_released[idx])
            .unwrap_or(false)
    }

    fn keys_down(&self) -> Vec<KeyCode> {
        self.keys_down.iter().copied().collect()
    }
}

fn mouse_button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        MouseButton::Back => Some(3),
        MouseButton::Forward => Some(4),
        MouseButton::Other(raw) => {
            let mapped = 5 + raw as usize; // 0-4 are the named buttons
            (mapped < 8).then_some(mapped)
        }
    }
}
