//! Translation of window events into engine commands.
//!
//! [`Input`] tracks the cursor (in pixels and normalized device
//! coordinates), right-button orbit drags and the scroll wheel, and queues a
//! [`Command`] for every bound key press.
//!
//! | Key | Command |
//! |-----|---------|
//! | Space | toggle pause |
//! | R | reset |
//! | 1-7 | select preset |
//! | Tab | next preset |
//! | C | toggle color transition |
//! | M | toggle mouse interaction |
//! | Escape | quit |

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::presets::MotionPreset;

/// Action requested by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Reset,
    SelectPreset(MotionPreset),
    NextPreset,
    ToggleColorTransition,
    ToggleMouseInteraction,
    Quit,
}

impl Command {
    /// The command bound to a key, if any.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let preset = |i: usize| Some(Command::SelectPreset(MotionPreset::ALL[i]));
        match key {
            KeyCode::Space => Some(Command::TogglePause),
            KeyCode::KeyR => Some(Command::Reset),
            KeyCode::Tab => Some(Command::NextPreset),
            KeyCode::KeyC => Some(Command::ToggleColorTransition),
            KeyCode::KeyM => Some(Command::ToggleMouseInteraction),
            KeyCode::Escape => Some(Command::Quit),
            KeyCode::Digit1 => preset(0),
            KeyCode::Digit2 => preset(1),
            KeyCode::Digit3 => preset(2),
            KeyCode::Digit4 => preset(3),
            KeyCode::Digit5 => preset(4),
            KeyCode::Digit6 => preset(5),
            KeyCode::Digit7 => preset(6),
            _ => None,
        }
    }
}

/// Cursor position in pixels to normalized device coordinates.
///
/// Origin at the window center, X right, Y up.
pub fn cursor_to_ndc(position: Vec2, window_size: (u32, u32)) -> Option<Vec2> {
    let (w, h) = window_size;
    if w == 0 || h == 0 {
        return None;
    }
    Some(Vec2::new(
        (position.x / w as f32) * 2.0 - 1.0,
        1.0 - (position.y / h as f32) * 2.0,
    ))
}

/// Input state accumulated between frames.
#[derive(Debug, Default)]
pub struct Input {
    commands: Vec<Command>,
    cursor: Option<Vec2>,
    orbiting: bool,
    orbit_delta: Vec2,
    scroll_delta: f32,
    window_size: (u32, u32),
}

impl Input {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self {
            window_size,
            ..Default::default()
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Cursor in normalized device coordinates, or `None` outside the window.
    pub fn cursor_ndc(&self) -> Option<Vec2> {
        self.cursor.and_then(|c| cursor_to_ndc(c, self.window_size))
    }

    /// Pixels dragged with the right button since the last frame.
    pub fn orbit_delta(&self) -> Vec2 {
        self.orbit_delta
    }

    /// Scroll lines since the last frame, positive away from the user.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Take the commands queued since the last call.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Clear per-frame deltas.
    pub fn end_frame(&mut self) {
        self.orbit_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Feed one window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        if let Some(command) = Command::from_key(key) {
                            self.commands.push(command);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button: MouseButton::Right, .. } => {
                self.orbiting = *state == ElementState::Pressed;
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.orbiting = false;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }

    fn move_cursor(&mut self, position: Vec2) {
        if self.orbiting {
            if let Some(previous) = self.cursor {
                self.orbit_delta += position - previous;
            }
        }
        self.cursor = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(Command::from_key(KeyCode::Space), Some(Command::TogglePause));
        assert_eq!(
            Command::from_key(KeyCode::Digit4),
            Some(Command::SelectPreset(MotionPreset::Explosion))
        );
        assert_eq!(
            Command::from_key(KeyCode::Digit7),
            Some(Command::SelectPreset(MotionPreset::Aurora))
        );
        assert_eq!(Command::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_cursor_to_ndc() {
        let center = cursor_to_ndc(Vec2::new(400.0, 300.0), (800, 600)).unwrap();
        assert!(center.length() < 1e-6);

        let corner = cursor_to_ndc(Vec2::new(0.0, 0.0), (800, 600)).unwrap();
        assert_eq!(corner, Vec2::new(-1.0, 1.0));

        assert_eq!(cursor_to_ndc(Vec2::ZERO, (0, 600)), None);
    }

    #[test]
    fn test_orbit_only_while_right_held() {
        let mut input = Input::new((800, 600));
        input.move_cursor(Vec2::new(100.0, 100.0));
        input.move_cursor(Vec2::new(120.0, 100.0));
        assert_eq!(input.orbit_delta(), Vec2::ZERO);

        input.orbiting = true;
        input.move_cursor(Vec2::new(130.0, 95.0));
        assert_eq!(input.orbit_delta(), Vec2::new(10.0, -5.0));

        input.end_frame();
        assert_eq!(input.orbit_delta(), Vec2::ZERO);
        assert!(input.cursor_ndc().is_some());
    }

    #[test]
    fn test_drain_commands_empties_queue() {
        let mut input = Input::new((800, 600));
        input.commands.push(Command::Reset);
        assert_eq!(input.drain_commands(), vec![Command::Reset]);
        assert!(input.drain_commands().is_empty());
    }
}
