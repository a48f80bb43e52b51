use std::collections::HashSet;

use glam::{vec2, Vec2};
use winit::event::{ElementState, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};

pub type Key = VirtualKeyCode;

/// Polled input, as read by per-frame update code.
pub trait Input {
    fn is_key_down(&self, key: Key) -> bool;
    /// True only during the frame the key went down.
    fn was_key_pressed(&self, key: Key) -> bool;
    fn is_mouse_button_down(&self, button: MouseButton) -> bool;
    /// Cursor position in physical pixels.
    fn mouse_position(&self) -> Vec2;
}

#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => self.set_key(*keycode, *state),
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = vec2(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            _ => (),
        }
    }

    fn set_key(&mut self, key: Key, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat reports Pressed again; only the first counts.
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
            }
        }
    }

    /// Forgets this frame's key presses. Call after the update step.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }
}

impl Input for InputState {
    fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    fn was_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}
