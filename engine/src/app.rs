//! Application management for the engine

use crate::audio::Mixer;
use crate::config::{ConfigError, GameConfig};
use crate::context::EngineContext;
use crate::graphics::Surface;
use crate::io::{DirSource, GameDb, MemorySource, ResourceSource, StoreError};
use crate::particles::ParticleSystem;
use crate::state::{DemoState, GameState, StateError, StateFactory, StateMachine};
use crate::windowing::{HeadlessPlatform, Platform};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Name of the configuration file inside a game directory
pub const CONFIG_FILE: &str = "game.json";

/// Errors raised while building or starting the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no start state configured ([init] startstate)")]
    NoStartState,
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Main engine application: the current state, the shared services and
/// the surface states draw on
pub struct Engine {
    ctx: EngineContext,
    machine: StateMachine,
    surface: Surface,
    save_path: Option<PathBuf>,
}

impl Engine {
    /// Shared services handed to every state
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Name of the running state
    pub fn current_state(&self) -> Option<&str> {
        self.machine.current_name()
    }

    /// The surface as the last update left it
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Whether there is a running state and nobody asked to quit
    pub fn is_running(&self) -> bool {
        self.machine.is_running() && !self.ctx.quit_requested()
    }

    /// Enter the configured start state
    pub fn start(&mut self) -> Result<(), EngineError> {
        let name = self
            .ctx
            .settings
            .start_state
            .clone()
            .ok_or(EngineError::NoStartState)?;
        info!(state = %name, "Starting game");
        self.machine.enter(&name, &self.ctx)?;
        Ok(())
    }

    /// Enter the built-in demo state
    pub fn start_demo(&mut self) -> Result<(), EngineError> {
        info!("No game configured, starting demo");
        self.machine
            .enter_state(Box::new(DemoState::new("demo")), &self.ctx)?;
        Ok(())
    }

    /// Enter an already-built state
    pub fn start_with(&mut self, state: Box<dyn GameState>) -> Result<(), EngineError> {
        self.machine.enter_state(state, &self.ctx)?;
        Ok(())
    }

    /// Run one frame: update the current state, apply the transition it
    /// asked for, then present the frame
    ///
    /// Returns whether the engine is still running afterwards.
    pub fn step(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        if let Some(transition) = self.machine.update(&self.ctx, &mut self.surface) {
            debug!(transition = ?transition, "Applying transition");
            self.machine.apply(transition, &self.ctx);
        }

        if !self.ctx.quit_requested() {
            self.ctx.frame.borrow_mut().advance_frame(&mut self.surface);
        }
        self.is_running()
    }

    /// Run at most `max_frames` frames and return how many ran
    pub fn run_frames(&mut self, max_frames: u64) -> u64 {
        let mut frames = 0;
        while frames < max_frames && self.is_running() {
            self.step();
            frames += 1;
        }
        frames
    }

    /// Run until the game quits, then shut down
    pub fn run(&mut self) {
        info!("Entering main loop");
        while self.step() {}
        self.shutdown();
    }

    /// Stop the current state and save the game database
    pub fn shutdown(&mut self) {
        self.machine.leave(&self.ctx);
        if let Some(path) = &self.save_path {
            if let Err(e) = self.ctx.store.borrow().save(path) {
                error!(path = %path.display(), error = %e, "Unable to save game database");
            }
        }
        info!("Engine shut down");
    }
}

/// Builder pattern for Engine configuration
pub struct EngineBuilder {
    config: GameConfig,
    platform: Option<Box<dyn Platform>>,
    source: Option<Box<dyn ResourceSource>>,
    mixer: Option<Rc<RefCell<dyn Mixer>>>,
    particles: Option<Rc<RefCell<dyn ParticleSystem>>>,
    factory: StateFactory,
    save_path: Option<PathBuf>,
}

impl EngineBuilder {
    /// Create a builder with an empty configuration
    pub fn new() -> Self {
        Self {
            config: GameConfig::new(),
            platform: None,
            source: None,
            mixer: None,
            particles: None,
            factory: StateFactory::new(),
            save_path: None,
        }
    }

    /// Configure a game stored in a directory: `game.json` plus its assets
    pub fn game_dir(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        let dir = dir.as_ref();
        let config = GameConfig::load(dir.join(CONFIG_FILE))?;
        Ok(Self::new().config(config).source(DirSource::new(dir)))
    }

    /// Set the game configuration
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the window/clock backend (headless by default)
    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    /// Set where resources are read from (empty by default)
    pub fn source(mut self, source: impl ResourceSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Replace the default software mixer
    pub fn mixer(mut self, mixer: impl Mixer + 'static) -> Self {
        self.mixer = Some(Rc::new(RefCell::new(mixer)));
        self
    }

    /// Replace the default particle system
    pub fn particles(mut self, particles: impl ParticleSystem + 'static) -> Self {
        self.particles = Some(Rc::new(RefCell::new(particles)));
        self
    }

    /// Register a native state kind
    pub fn state_kind<F>(mut self, kind: &str, constructor: F) -> Self
    where
        F: Fn(&str) -> Box<dyn GameState> + 'static,
    {
        self.factory.register(kind, constructor);
        self
    }

    /// Load the game database from `path` if it exists, and save it there on shutdown
    pub fn save_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// Build the Engine
    pub fn build(self) -> Result<Engine, EngineError> {
        let settings = self.config.settings();
        info!(
            title = %settings.title,
            fps = settings.fps,
            width = settings.virtual_width,
            height = settings.virtual_height,
            "Creating engine"
        );

        let platform = self.platform.unwrap_or_else(|| {
            Box::new(HeadlessPlatform::new(
                settings.virtual_width,
                settings.virtual_height,
            ))
        });
        let source = self
            .source
            .unwrap_or_else(|| Box::new(MemorySource::new()));

        let mut ctx = EngineContext::new(self.config, platform, source);
        if let Some(mixer) = self.mixer {
            ctx.mixer = mixer;
        }
        if let Some(particles) = self.particles {
            ctx.particles = particles;
        }
        if let Some(path) = self.save_path.as_deref().filter(|p| p.exists()) {
            ctx.store = Rc::new(RefCell::new(GameDb::load(path)?));
        }

        let surface = ctx.new_surface();
        Ok(Engine {
            ctx,
            machine: StateMachine::new(self.factory),
            surface,
            save_path: self.save_path,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::Transition;

    struct Countdown {
        left: u32,
    }

    impl GameState for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        fn init(&mut self, _ctx: &EngineContext) -> Result<(), StateError> {
            Ok(())
        }

        fn update(&mut self, _ctx: &EngineContext, surface: &mut Surface) -> Option<Transition> {
            surface.pixel(0, 0);
            self.left = self.left.saturating_sub(1);
            (self.left == 0).then_some(Transition::Quit)
        }

        fn deinit(&mut self, _ctx: &EngineContext) {}
    }

    #[test]
    fn test_start_requires_start_state() {
        let mut engine = EngineBuilder::new().build().unwrap();
        assert!(matches!(engine.start(), Err(EngineError::NoStartState)));
        assert!(!engine.step());
    }

    #[test]
    fn test_unknown_start_state_fails() {
        let mut config = GameConfig::new();
        config.set("init", "startstate", "missing");
        let mut engine = EngineBuilder::new().config(config).build().unwrap();
        assert!(matches!(
            engine.start(),
            Err(EngineError::State(StateError::UnknownState(_)))
        ));
    }

    #[test]
    fn test_step_presents_until_quit() {
        let platform = HeadlessPlatform::new(320, 240);
        let mut engine = EngineBuilder::new()
            .platform(platform.clone())
            .build()
            .unwrap();
        engine.start_with(Box::new(Countdown { left: 3 })).unwrap();

        assert_eq!(engine.run_frames(10), 3);
        assert_eq!(platform.frames_presented(), 2);
        assert!(engine.context().quit_requested());
        engine.shutdown();
        assert_eq!(engine.current_state(), None);
    }

    #[test]
    fn test_demo_runs_bounded() {
        let platform = HeadlessPlatform::new(320, 240);
        let mut engine = EngineBuilder::new()
            .platform(platform.clone())
            .build()
            .unwrap();
        engine.start_demo().unwrap();
        assert_eq!(engine.run_frames(5), 5);
        assert_eq!(platform.frames_presented(), 5);
        assert_eq!(engine.current_state(), Some("demo"));
    }

    #[test]
    fn test_native_state_kind() {
        let mut config = GameConfig::new();
        config.set("init", "startstate", "count");
        config.set("count", "type", "countdown");
        let mut engine = EngineBuilder::new()
            .config(config)
            .state_kind("countdown", |_| Box::new(Countdown { left: 2 }))
            .build()
            .unwrap();
        engine.start().unwrap();
        engine.run();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_store_saved_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let mut engine = EngineBuilder::new().save_file(&path).build().unwrap();
        engine.context().store.borrow_mut().shared_mut().set("hiscore", "900");
        engine.shutdown();

        let engine = EngineBuilder::new().save_file(&path).build().unwrap();
        assert_eq!(
            engine.context().store.borrow().shared().get("hiscore"),
            Some("900")
        );
    }
}
