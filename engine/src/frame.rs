//! Frame driver: presentation, pacing and input pumping

use crate::graphics::Surface;
use crate::input::InputState;
use crate::windowing::{Platform, PlatformEvent};
use tracing::{debug, info};

/// Advances display frames and owns the per-frame input snapshot
pub struct FrameDriver {
    platform: Box<dyn Platform>,
    input: InputState,
    quit: bool,
    fps: u32,
    frame_start: u64,
    frames: u64,
}

impl FrameDriver {
    /// Create a driver pacing to `fps` frames per second
    pub fn new(platform: Box<dyn Platform>, fps: u32) -> Self {
        let fps = fps.max(1);
        let frame_start = platform.ticks();
        debug!(fps, "Creating frame driver");
        Self {
            platform,
            input: InputState::new(),
            quit: false,
            fps,
            frame_start,
            frames: 0,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Milliseconds per frame at the configured rate
    pub fn frame_ms(&self) -> u64 {
        1000 / self.fps as u64
    }

    /// Frames advanced so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Whether the engine has been asked to stop
    pub fn quit(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        if !self.quit {
            info!("Quit requested");
        }
        self.quit = true;
    }

    pub fn ticks(&self) -> u64 {
        self.platform.ticks()
    }

    pub fn sleep(&mut self, ms: u64) {
        self.platform.sleep(ms);
    }

    /// Present `surface`, wait out the rest of the frame, then pump input
    ///
    /// The surface keeps its size, color, font and clip state; only its
    /// recorded commands are consumed.
    pub fn advance_frame(&mut self, surface: &mut Surface) {
        let commands = surface.take_commands();
        self.platform
            .present(&commands, surface.width(), surface.height());

        let frame_ms = self.frame_ms();
        let elapsed = self.platform.ticks().saturating_sub(self.frame_start);
        if elapsed < frame_ms {
            self.platform.sleep(frame_ms - elapsed);
        }
        self.frame_start = self.platform.ticks();

        let mouse = self.platform.mouse();
        let (window_w, window_h) = self.platform.window_size();
        let scale = |value: i32, window: u32, virt: i32| {
            if window == 0 {
                value
            } else {
                (value as i64 * virt as i64 / window as i64) as i32
            }
        };
        self.input.update_mouse(
            scale(mouse.x, window_w, surface.width()),
            scale(mouse.y, window_h, surface.height()),
            mouse.buttons,
        );

        for event in self.platform.poll_events() {
            match event {
                PlatformEvent::Quit => self.request_quit(),
                PlatformEvent::KeyDown(key) => match key.as_str() {
                    "escape" => self.request_quit(),
                    "f11" => self.platform.toggle_fullscreen(),
                    _ => self.input.set_key_pressed(&key, true),
                },
                PlatformEvent::KeyUp(key) => self.input.set_key_pressed(&key, false),
                PlatformEvent::Resized(w, h) => {
                    debug!(width = w, height = h, "Window resized");
                }
            }
        }

        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Color;
    use crate::input::MouseButton;
    use crate::windowing::HeadlessPlatform;

    fn driver(fps: u32) -> (FrameDriver, HeadlessPlatform) {
        let platform = HeadlessPlatform::new(640, 480);
        (FrameDriver::new(Box::new(platform.clone()), fps), platform)
    }

    #[test]
    fn test_advance_presents_and_paces() {
        let (mut driver, platform) = driver(50);
        let mut surface = Surface::new(320, 240);
        surface.clear(Color::BLACK);
        surface.pixel(1, 1);

        driver.advance_frame(&mut surface);
        assert_eq!(platform.frames_presented(), 1);
        assert_eq!(platform.last_frame().len(), 2);
        assert!(surface.commands().is_empty());
        assert_eq!(driver.ticks(), 20);

        // Time already spent inside the frame is not slept again
        platform.advance(15);
        driver.advance_frame(&mut surface);
        assert_eq!(driver.ticks(), 40);

        platform.advance(100);
        driver.advance_frame(&mut surface);
        assert_eq!(driver.ticks(), 140);
        assert_eq!(driver.frames(), 3);
    }

    #[test]
    fn test_mouse_is_scaled_to_surface() {
        let (mut driver, platform) = driver(33);
        let mut surface = Surface::new(320, 240);
        platform.set_mouse(640, 240, MouseButton::Left.mask());
        driver.advance_frame(&mut surface);

        assert_eq!(driver.input().mouse_position, (320, 120));
        assert!(driver.input().button_down(MouseButton::Left));

        platform.set_mouse(0, 0, 0);
        driver.advance_frame(&mut surface);
        assert!(driver.input().clicked(MouseButton::Left));
        driver.advance_frame(&mut surface);
        assert!(!driver.input().clicked(MouseButton::Left));
    }

    #[test]
    fn test_special_keys() {
        let (mut driver, platform) = driver(33);
        let mut surface = Surface::new(320, 240);

        platform.push_event(PlatformEvent::KeyDown("f11".into()));
        platform.push_event(PlatformEvent::KeyDown("x".into()));
        driver.advance_frame(&mut surface);
        assert!(platform.is_fullscreen());
        assert!(driver.input().key_down("x"));
        assert!(!driver.quit());

        platform.push_event(PlatformEvent::KeyUp("x".into()));
        platform.push_event(PlatformEvent::KeyDown("escape".into()));
        driver.advance_frame(&mut surface);
        assert!(!driver.input().key_down("x"));
        assert!(driver.quit());
    }

    #[test]
    fn test_quit_event_sets_flag() {
        let (mut driver, platform) = driver(33);
        let mut surface = Surface::new(320, 240);
        platform.push_event(PlatformEvent::Quit);
        driver.advance_frame(&mut surface);
        assert!(driver.quit());
    }
}
