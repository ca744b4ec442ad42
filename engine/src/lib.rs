//! Scriptable 2D game engine core
//!
//! This crate runs games built from named states. Each state is a Lua
//! script driven by callbacks, a Rhai script re-run every frame, or a
//! native Rust state, and draws onto a recorded 2D surface.

pub mod app;
pub mod audio;
pub mod config;
pub mod context;
pub mod frame;
pub mod graphics;
pub mod input;
pub mod io;
pub mod particles;
pub mod scripting;
pub mod state;
pub mod windowing;

// Re-export commonly used types
pub mod prelude {
    // App types
    pub use crate::app::{Engine, EngineBuilder, EngineError};

    // Config types
    pub use crate::config::{EngineSettings, GameConfig};

    // Shared services
    pub use crate::context::EngineContext;
    pub use crate::frame::FrameDriver;

    // Graphics types
    pub use crate::graphics::{Color, DrawCommand, Font, Shape, Surface};

    // IO types
    pub use crate::io::{DirSource, GameDb, MemorySource, ResourceCache, ResourceSource};

    // Audio types
    pub use crate::audio::{Loops, Mixer, SoftMixer};

    // State types
    pub use crate::scripting::{LuaState, RhaiState, Transition};
    pub use crate::state::{GameState, StateError, StateFactory, StateMachine};

    // Input and platform types
    pub use crate::input::{InputState, MouseButton};
    pub use crate::windowing::{HeadlessPlatform, Platform, PlatformEvent};
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
