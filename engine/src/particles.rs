//! Particle system hook
//!
//! Particle simulation lives outside the scripting core; states can only
//! ask it to drop every live particle.

use tracing::trace;

/// Particle subsystem as seen by game states
pub trait ParticleSystem {
    /// Remove every live particle
    fn clear(&mut self);
}

/// Particle system that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoParticles;

impl ParticleSystem for NoParticles {
    fn clear(&mut self) {
        trace!("Clearing particles");
    }
}
