//! Built-in state shown when no game is configured

use super::{GameState, StateError};
use crate::context::EngineContext;
use crate::graphics::{Color, Surface};
use crate::scripting::Transition;
use tracing::info;

const BANNER: &str = "Rengine";

/// Bounces a banner around the screen until the engine quits
pub struct DemoState {
    name: String,
    position: (i32, i32),
    velocity: (i32, i32),
    hue: f64,
}

impl DemoState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: (0, 0),
            velocity: (1, 1),
            hue: 0.0,
        }
    }

    /// Top-left corner of the banner
    pub fn position(&self) -> (i32, i32) {
        self.position
    }
}

impl GameState for DemoState {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &EngineContext) -> Result<(), StateError> {
        self.position = (
            ctx.settings.virtual_width as i32 / 4,
            ctx.settings.virtual_height as i32 / 3,
        );
        info!(state = %self.name, "Starting demo mode");
        Ok(())
    }

    fn update(&mut self, _ctx: &EngineContext, surface: &mut Surface) -> Option<Transition> {
        surface.clear(Color::BLACK);

        let w = surface.text_width(BANNER);
        let h = surface.text_height(BANNER);
        let (mut x, mut y) = (self.position.0 + self.velocity.0, self.position.1 + self.velocity.1);
        if x < 0 || x + w > surface.width() {
            self.velocity.0 = -self.velocity.0;
            x = x.clamp(0, (surface.width() - w).max(0));
        }
        if y < 0 || y + h > surface.height() {
            self.velocity.1 = -self.velocity.1;
            y = y.clamp(0, (surface.height() - h).max(0));
        }
        self.position = (x, y);

        self.hue = (self.hue + 0.01) % 1.0;
        let t = if self.hue < 0.5 { self.hue * 2.0 } else { 2.0 - self.hue * 2.0 };
        surface.set_color(Color::rgb(255, 255, 0).lerp(Color::rgb(0, 255, 255), t));
        surface.rect(x - 2, y - 2, x + w + 1, y + h + 1);
        surface.puts(x, y, BANNER);
        None
    }

    fn deinit(&mut self, _ctx: &EngineContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::io::MemorySource;
    use crate::windowing::HeadlessPlatform;

    #[test]
    fn test_banner_stays_on_screen() {
        let ctx = EngineContext::new(
            GameConfig::new(),
            Box::new(HeadlessPlatform::new(320, 240)),
            Box::new(MemorySource::new()),
        );
        let mut state = DemoState::new("demo");
        state.init(&ctx).unwrap();
        let mut surface = ctx.new_surface();

        for _ in 0..1000 {
            assert!(state.update(&ctx, &mut surface).is_none());
            let (x, y) = state.position();
            assert!(x >= 0 && x + 56 <= 320);
            assert!(y >= 0 && y + 8 <= 240);
        }
    }
}
