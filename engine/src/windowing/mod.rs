//! Window and event-source abstraction
//!
//! The engine core never talks to a windowing library directly. A
//! `Platform` presents finished frames, reports input, and owns the clock
//! used for frame pacing.

mod headless;

pub use headless::HeadlessPlatform;

use crate::graphics::DrawCommand;

/// Events reported by the platform between frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The window was closed or the process asked to stop
    Quit,
    /// A key went down; names are lowercase (`"escape"`, `"a"`, `"f11"`)
    KeyDown(String),
    KeyUp(String),
    /// The window was resized to the given size in pixels
    Resized(u32, u32),
}

/// Raw mouse sample in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseSample {
    pub x: i32,
    pub y: i32,
    /// Held buttons, bit 0 = left, bit 1 = middle, bit 2 = right
    pub buttons: u32,
}

/// Host window, clock and event source
pub trait Platform {
    /// Display a finished frame drawn on a `width` x `height` surface
    fn present(&mut self, commands: &[DrawCommand], width: i32, height: i32);

    /// Drain pending events
    fn poll_events(&mut self) -> Vec<PlatformEvent>;

    /// Current mouse state in window coordinates
    fn mouse(&self) -> MouseSample;

    /// Window size in pixels
    fn window_size(&self) -> (u32, u32);

    /// Milliseconds since the platform started
    fn ticks(&self) -> u64;

    /// Block for `ms` milliseconds
    fn sleep(&mut self, ms: u64);

    fn toggle_fullscreen(&mut self);
}
