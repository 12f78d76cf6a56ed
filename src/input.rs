use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a window event asks the museum to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Left click at a pixel position.
    Click(Vec2),
    /// Escape: close the popup, or quit when it is already closed.
    Dismiss,
}

/// Tracks keyboard and mouse state and turns fresh presses into [`Command`]s.
///
/// Held keys and buttons are remembered so OS auto-repeat does not fire the
/// same command twice.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<Command> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return None;
                };
                match event.state {
                    ElementState::Pressed => self.press_key(key),
                    ElementState::Released => {
                        self.keys_down.remove(&key);
                        None
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                    None
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(position.x as f32, position.y as f32);
                None
            }
            WindowEvent::Focused(false) => {
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
                None
            }
            _ => None,
        }
    }

    pub fn press_key(&mut self, key: KeyCode) -> Option<Command> {
        let fresh = self.keys_down.insert(key);
        (fresh && key == KeyCode::Escape).then_some(Command::Dismiss)
    }

    pub fn press_button(&mut self, button: MouseButton) -> Option<Command> {
        let fresh = self.mouse_buttons_down.insert(button);
        (fresh && button == MouseButton::Left).then_some(Command::Click(self.mouse_position))
    }

    pub fn move_cursor(&mut self, x: f32, y: f32) {
        self.mouse_position = Vec2::new(x, y);
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Last cursor position in physical pixels, origin top-left.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_click_reports_cursor_position() {
        let mut input = Input::new();
        input.move_cursor(120.0, 48.5);
        assert_eq!(
            input.press_button(MouseButton::Left),
            Some(Command::Click(Vec2::new(120.0, 48.5)))
        );
        assert!(input.mouse_down(MouseButton::Left));
    }

    #[test]
    fn other_buttons_do_nothing() {
        let mut input = Input::new();
        assert_eq!(input.press_button(MouseButton::Right), None);
        assert_eq!(input.press_button(MouseButton::Middle), None);
    }

    #[test]
    fn held_button_clicks_once() {
        let mut input = Input::new();
        assert!(input.press_button(MouseButton::Left).is_some());
        assert_eq!(input.press_button(MouseButton::Left), None);
    }

    #[test]
    fn escape_dismisses_once_per_press() {
        let mut input = Input::new();
        assert_eq!(input.press_key(KeyCode::Escape), Some(Command::Dismiss));
        assert_eq!(input.press_key(KeyCode::Escape), None);
        assert!(input.key_down(KeyCode::Escape));
        assert_eq!(input.press_key(KeyCode::KeyA), None);
    }
}
