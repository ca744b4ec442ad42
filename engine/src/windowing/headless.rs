//! Deterministic platform without a window
//!
//! Time only moves when the engine sleeps, and input is injected by the
//! caller. Clones share the same state so a test can keep a handle while
//! the engine owns another.

use super::{MouseSample, Platform, PlatformEvent};
use crate::graphics::DrawCommand;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Inner {
    clock_ms: u64,
    window: (u32, u32),
    mouse: MouseSample,
    pending: VecDeque<PlatformEvent>,
    /// Events delivered once the given number of frames has been presented
    scheduled: Vec<(u64, PlatformEvent)>,
    frames_presented: u64,
    last_frame: Vec<DrawCommand>,
    fullscreen: bool,
}

/// Platform that records frames instead of displaying them
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    inner: Rc<RefCell<Inner>>,
}

impl HeadlessPlatform {
    /// Create a headless platform with a window of the given size
    pub fn new(width: u32, height: u32) -> Self {
        debug!(width, height, "Creating headless platform");
        Self {
            inner: Rc::new(RefCell::new(Inner {
                window: (width, height),
                ..Inner::default()
            })),
        }
    }

    /// Queue an event for the next poll
    pub fn push_event(&self, event: PlatformEvent) {
        self.inner.borrow_mut().pending.push_back(event);
    }

    /// Queue an event that is delivered once `frame` frames have been presented
    pub fn schedule_event(&self, frame: u64, event: PlatformEvent) {
        self.inner.borrow_mut().scheduled.push((frame, event));
    }

    /// Set the mouse position (window coordinates) and held-button mask
    pub fn set_mouse(&self, x: i32, y: i32, buttons: u32) {
        self.inner.borrow_mut().mouse = MouseSample { x, y, buttons };
    }

    /// Move the clock forward without going through the engine
    pub fn advance(&self, ms: u64) {
        self.inner.borrow_mut().clock_ms += ms;
    }

    pub fn frames_presented(&self) -> u64 {
        self.inner.borrow().frames_presented
    }

    /// Commands of the most recently presented frame
    pub fn last_frame(&self) -> Vec<DrawCommand> {
        self.inner.borrow().last_frame.clone()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.inner.borrow().fullscreen
    }
}

impl Platform for HeadlessPlatform {
    fn present(&mut self, commands: &[DrawCommand], width: i32, height: i32) {
        let mut inner = self.inner.borrow_mut();
        inner.frames_presented += 1;
        inner.last_frame = commands.to_vec();
        trace!(
            frame = inner.frames_presented,
            commands = commands.len(),
            width,
            height,
            "Presented frame"
        );
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        let mut inner = self.inner.borrow_mut();
        let presented = inner.frames_presented;
        let mut events: Vec<PlatformEvent> = inner.pending.drain(..).collect();

        let (due, later): (Vec<_>, Vec<_>) = inner
            .scheduled
            .drain(..)
            .partition(|(frame, _)| *frame <= presented);
        inner.scheduled = later;
        events.extend(due.into_iter().map(|(_, event)| event));
        events
    }

    fn mouse(&self) -> MouseSample {
        self.inner.borrow().mouse
    }

    fn window_size(&self) -> (u32, u32) {
        self.inner.borrow().window
    }

    fn ticks(&self) -> u64 {
        self.inner.borrow().clock_ms
    }

    fn sleep(&mut self, ms: u64) {
        self.inner.borrow_mut().clock_ms += ms;
    }

    fn toggle_fullscreen(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.fullscreen = !inner.fullscreen;
        debug!(fullscreen = inner.fullscreen, "Toggled fullscreen");
    }
}
