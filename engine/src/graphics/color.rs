//! RGB colors parsed from names and hex notation

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned for unparseable color specifications
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color '{0}'")]
pub struct ColorError(pub String);

/// An opaque 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xFFFFFF),
    ("red", 0xFF0000),
    ("green", 0x008000),
    ("lime", 0x00FF00),
    ("blue", 0x0000FF),
    ("yellow", 0xFFFF00),
    ("cyan", 0x00FFFF),
    ("aqua", 0x00FFFF),
    ("magenta", 0xFF00FF),
    ("fuchsia", 0xFF00FF),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("silver", 0xC0C0C0),
    ("maroon", 0x800000),
    ("olive", 0x808000),
    ("navy", 0x000080),
    ("purple", 0x800080),
    ("teal", 0x008080),
    ("orange", 0xFFA500),
    ("brown", 0xA52A2A),
    ("pink", 0xFFC0CB),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Build a color from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` integer; higher bits are ignored
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Pack into a `0xRRGGBB` integer
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Linear interpolation; `t` is clamped to `0..=1`
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl FromStr for Color {
    type Err = ColorError;

    /// Accepts color names, `#rgb` and `#rrggbb`
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let trimmed = spec.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ColorError(spec.to_string()));
            }
            let value = u32::from_str_radix(hex, 16).map_err(|_| ColorError(spec.to_string()))?;
            return match hex.len() {
                6 => Ok(Color::from_u32(value)),
                3 => {
                    let expand = |nibble: u32| ((nibble & 0xF) * 0x11) as u8;
                    Ok(Color::rgb(expand(value >> 8), expand(value >> 4), expand(value)))
                }
                _ => Err(ColorError(spec.to_string())),
            };
        }

        let lower = trimmed.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, value)| Color::from_u32(*value))
            .ok_or_else(|| ColorError(spec.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_hex() {
        assert_eq!("white".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("Navy".parse::<Color>().unwrap(), Color::rgb(0, 0, 0x80));
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("#f80".parse::<Color>().unwrap(), Color::rgb(255, 0x88, 0));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Color::BLACK;
        let b = Color::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(128, 128, 128));
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn test_u32_packing() {
        let c = Color::rgb(0x12, 0x34, 0x56);
        assert_eq!(c.to_u32(), 0x123456);
        assert_eq!(Color::from_u32(0xFF123456), c);
        assert_eq!(c.to_string(), "#123456");
    }
}
