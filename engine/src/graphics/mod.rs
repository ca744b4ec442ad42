//! Graphics module
//!
//! Provides the 2D drawing surface handed to game states each frame,
//! along with colors and bitmap fonts.

pub mod color;
pub mod font;
pub mod surface;

// Re-export commonly used types
pub use color::{Color, ColorError};
pub use font::Font;
pub use surface::{Blit, ClipRect, DrawCommand, Shape, Surface};
