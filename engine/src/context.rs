//! Shared engine services handed to every game state

use crate::audio::{Mixer, SoftMixer};
use crate::config::{EngineSettings, GameConfig};
use crate::frame::FrameDriver;
use crate::graphics::Surface;
use crate::io::{GameDb, ResourceCache, ResourceSource};
use crate::particles::{NoParticles, ParticleSystem};
use crate::windowing::Platform;
use std::cell::RefCell;
use std::rc::Rc;

/// Handles to the engine services
///
/// Cloning is cheap and every clone refers to the same services, so script
/// bindings keep their own clone instead of reaching for globals.
#[derive(Clone)]
pub struct EngineContext {
    pub config: Rc<GameConfig>,
    pub settings: Rc<EngineSettings>,
    pub frame: Rc<RefCell<FrameDriver>>,
    pub resources: Rc<RefCell<ResourceCache>>,
    pub store: Rc<RefCell<GameDb>>,
    pub mixer: Rc<RefCell<dyn Mixer>>,
    pub particles: Rc<RefCell<dyn ParticleSystem>>,
}

impl EngineContext {
    /// Assemble a context with the default mixer and particle system
    pub fn new(
        config: GameConfig,
        platform: Box<dyn Platform>,
        source: Box<dyn ResourceSource>,
    ) -> Self {
        let settings = config.settings();
        let frame = FrameDriver::new(platform, settings.fps);
        Self {
            config: Rc::new(config),
            settings: Rc::new(settings),
            frame: Rc::new(RefCell::new(frame)),
            resources: Rc::new(RefCell::new(ResourceCache::new(source))),
            store: Rc::new(RefCell::new(GameDb::new())),
            mixer: Rc::new(RefCell::new(SoftMixer::new())),
            particles: Rc::new(RefCell::new(NoParticles)),
        }
    }

    /// Replace the mixer
    pub fn with_mixer(mut self, mixer: impl Mixer + 'static) -> Self {
        self.mixer = Rc::new(RefCell::new(mixer));
        self
    }

    /// Replace the particle system
    pub fn with_particles(mut self, particles: impl ParticleSystem + 'static) -> Self {
        self.particles = Rc::new(RefCell::new(particles));
        self
    }

    /// A blank surface of the configured virtual size
    pub fn new_surface(&self) -> Surface {
        Surface::new(self.settings.virtual_width, self.settings.virtual_height)
    }

    /// Whether the engine has been asked to stop
    pub fn quit_requested(&self) -> bool {
        self.frame.borrow().quit()
    }
}
