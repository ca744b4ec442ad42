//! Game states and the machine that switches between them
//!
//! A game state is whatever the main loop drives once per frame: a
//! scripted state hosting an interpreter, or a native state such as the
//! demo. States are created by name from their configuration section.

mod demo;
mod factory;
mod machine;

pub use demo::DemoState;
pub use factory::{StateConstructor, StateFactory};
pub use machine::StateMachine;

use crate::config::ConfigError;
use crate::context::EngineContext;
use crate::graphics::Surface;
use crate::io::{MapError, ResourceError};
use crate::scripting::Transition;
use thiserror::Error;

/// Errors raised while creating or initialising a state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("no configuration section for state '{0}'")]
    UnknownState(String),
    #[error("state '{state}' has unknown type '{kind}'")]
    UnknownType { state: String, kind: String },
    #[error("state '{state}': {source}")]
    Config {
        state: String,
        #[source]
        source: ConfigError,
    },
    #[error("state '{state}': {source}")]
    Resource {
        state: String,
        #[source]
        source: ResourceError,
    },
    #[error("state '{state}': {source}")]
    Map {
        state: String,
        #[source]
        source: MapError,
    },
    #[error("state '{state}': script {script}: {message}")]
    Script {
        state: String,
        script: String,
        message: String,
    },
}

/// Lifecycle contract every state implements
///
/// `init` is called once when the state becomes current, `update` once per
/// frame while it is current, and `deinit` once when it stops being
/// current. `deinit` must also be safe after a failed `init`.
pub trait GameState {
    /// Name of the configuration section this state was created from
    fn name(&self) -> &str;

    fn init(&mut self, ctx: &EngineContext) -> Result<(), StateError>;

    /// Draw one frame into `surface`; a returned transition is applied
    /// after this call returns
    fn update(&mut self, ctx: &EngineContext, surface: &mut Surface) -> Option<Transition>;

    fn deinit(&mut self, ctx: &EngineContext);
}
