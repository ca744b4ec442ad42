//! Input state tracking

use std::collections::HashSet;
use tracing::trace;

/// Mouse buttons as numbered in scripts (1 = left, 2 = middle, 3 = right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left = 1,
    Middle = 2,
    Right = 3,
}

impl MouseButton {
    /// Map a script-facing button number; unknown numbers yield `None`
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            _ => None,
        }
    }

    /// Bit for this button in a button mask
    pub fn mask(self) -> u32 {
        1 << (self as u32 - 1)
    }
}

/// Tracks the current state of input devices
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Currently pressed keys, by lowercase key name
    pub keys_pressed: HashSet<String>,
    /// Mouse position in surface coordinates
    pub mouse_position: (i32, i32),
    /// Buttons held this frame
    pub mouse_buttons: u32,
    /// Buttons that were held last frame and released this frame
    pub mouse_clicked: u32,
}

impl InputState {
    /// Create a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press or release
    pub fn set_key_pressed(&mut self, key: &str, pressed: bool) {
        let key = key.to_ascii_lowercase();
        if pressed {
            trace!(key = %key, "Key pressed");
            self.keys_pressed.insert(key);
        } else {
            trace!(key = %key, "Key released");
            self.keys_pressed.remove(&key);
        }
    }

    /// Whether a named key is down
    pub fn key_down(&self, key: &str) -> bool {
        self.keys_pressed.contains(&key.to_ascii_lowercase())
    }

    /// First pressed key, if any
    pub fn any_key(&self) -> Option<&str> {
        self.keys_pressed.iter().next().map(String::as_str)
    }

    /// Forget a single key until it is pressed again
    pub fn release_key(&mut self, key: &str) {
        self.keys_pressed.remove(&key.to_ascii_lowercase());
    }

    /// Forget every pressed key
    pub fn reset_keys(&mut self) {
        self.keys_pressed.clear();
    }

    /// Feed a new mouse sample; computes which buttons were released
    pub fn update_mouse(&mut self, x: i32, y: i32, buttons: u32) {
        self.mouse_clicked = self.mouse_buttons & !buttons;
        self.mouse_buttons = buttons;
        self.mouse_position = (x, y);
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons & button.mask() != 0
    }

    /// Whether `button` was down last frame and is up this frame
    pub fn clicked(&self, button: MouseButton) -> bool {
        self.mouse_clicked & button.mask() != 0
    }
}
