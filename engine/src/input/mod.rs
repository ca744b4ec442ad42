//! Input handling module

mod state;

pub use state::{InputState, MouseButton};
