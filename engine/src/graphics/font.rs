//! Fixed-cell bitmap fonts

use std::fmt;
use std::str::FromStr;

/// Built-in bitmap fonts, each with a fixed glyph cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Font {
    #[default]
    Normal,
    Bold,
    Thick,
    Small,
}

impl Font {
    /// Width and height in pixels of one glyph cell
    pub fn cell(self) -> (i32, i32) {
        match self {
            Font::Normal | Font::Bold | Font::Thick => (8, 8),
            Font::Small => (5, 6),
        }
    }

    /// Name used in configuration and scripts
    pub fn name(self) -> &'static str {
        match self {
            Font::Normal => "normal",
            Font::Bold => "bold",
            Font::Thick => "thick",
            Font::Small => "small",
        }
    }
}

impl FromStr for Font {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Font::Normal),
            "bold" => Ok(Font::Bold),
            "thick" => Ok(Font::Thick),
            "small" => Ok(Font::Small),
            _ => Err(format!("unknown font '{name}'")),
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
