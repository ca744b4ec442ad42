//! Game configuration: sectioned key/value settings and style lookup

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Default frame rate when `screen.fps` is missing or invalid
pub const DEFAULT_FPS: u32 = 33;
/// Default virtual (surface) resolution
pub const DEFAULT_VIRTUAL_SIZE: (u32, u32) = (320, 240);
/// Default window title
pub const DEFAULT_TITLE: &str = "Rengine";

/// Section consulted when a state does not define a style property itself
pub const STYLES_SECTION: &str = "styles";

/// Built-in style values used when neither the state nor `styles` has one
const STYLE_DEFAULTS: &[(&str, &str)] = &[
    ("background", "black"),
    ("foreground", "white"),
    ("margin", "1"),
    ("padding", "1"),
    ("border", "1"),
    ("border-radius", "0"),
    ("border-color", "white"),
    ("button-padding", "5"),
    ("button-border-radius", "1"),
    ("font", "normal"),
];

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config root must be an object of sections")]
    NotSections,
    #[error("section [{0}] must be an object")]
    BadSection(String),
    #[error("missing [{section}] {key}")]
    Missing { section: String, key: String },
}

/// Sectioned configuration, case-insensitive on section and key names
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    sections: HashMap<String, HashMap<String, String>>,
}

impl GameConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a JSON object of objects
    ///
    /// Scalar values are stored in their string form so that numbers and
    /// booleans can be written naturally in the file.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(sections) = root else {
            return Err(ConfigError::NotSections);
        };

        let mut config = Self::new();
        for (section, body) in sections {
            let Value::Object(entries) = body else {
                return Err(ConfigError::BadSection(section));
            };
            for (key, value) in entries {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => continue,
                    other => other.to_string(),
                };
                config.set(&section, &key, text);
            }
        }

        debug!(sections = config.sections.len(), "Parsed game config");
        Ok(config)
    }

    /// Load configuration from a file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_ascii_lowercase())
            .or_default()
            .insert(key.to_ascii_lowercase(), value.into());
    }

    /// Look up a value
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_ascii_lowercase())?
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a value, falling back to `default`
    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Look up a value that must be present
    pub fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.get(section, key).ok_or_else(|| ConfigError::Missing {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    /// Whether a section exists at all
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(&section.to_ascii_lowercase())
    }

    /// Resolve a style property for a state
    ///
    /// Looks in the state's own section, then the `styles` section, then
    /// the built-in defaults. Unknown properties with no value yield `""`.
    pub fn style(&self, state: &str, key: &str) -> &str {
        if let Some(value) = self.get(state, key) {
            return value;
        }
        if let Some(value) = self.get(STYLES_SECTION, key) {
            return value;
        }
        let key = key.to_ascii_lowercase();
        STYLE_DEFAULTS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .unwrap_or("")
    }

    /// Resolve an integer style property, clamping negatives to zero
    pub fn style_int(&self, state: &str, key: &str) -> i64 {
        let raw = self.style(state, key);
        match raw.trim().parse::<i64>() {
            Ok(value) => value.max(0),
            Err(_) => {
                if !raw.is_empty() {
                    warn!(state = state, key = key, value = raw, "Non-numeric style value");
                }
                0
            }
        }
    }

    /// Engine-wide settings derived from the `init`, `screen` and `virtual` sections
    pub fn settings(&self) -> EngineSettings {
        let fps = self
            .get("screen", "fps")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|fps| *fps > 0)
            .map(|fps| fps as u32)
            .unwrap_or(DEFAULT_FPS);

        let dimension = |key: &str, default: u32| {
            self.get("virtual", key)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        EngineSettings {
            title: self.get_or("init", "appTitle", DEFAULT_TITLE).to_string(),
            start_state: self.get("init", "startstate").map(str::to_string),
            fps,
            virtual_width: dimension("width", DEFAULT_VIRTUAL_SIZE.0),
            virtual_height: dimension("height", DEFAULT_VIRTUAL_SIZE.1),
        }
    }
}

/// Settings the main loop needs before any state runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Window title
    pub title: String,
    /// Name of the first state to enter
    pub start_state: Option<String>,
    /// Target frames per second
    pub fps: u32,
    /// Width of the drawing surface handed to states
    pub virtual_width: u32,
    /// Height of the drawing surface handed to states
    pub virtual_height: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        GameConfig::new().settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_case_insensitive() {
        let config = GameConfig::from_json_str(
            r#"{ "Init": { "StartState": "intro", "appTitle": "Demo" }, "screen": { "fps": 60 } }"#,
        )
        .unwrap();

        assert_eq!(config.get("init", "startstate"), Some("intro"));
        assert_eq!(config.get("INIT", "APPTITLE"), Some("Demo"));
        assert_eq!(config.get("screen", "fps"), Some("60"));
        assert_eq!(config.get("screen", "missing"), None);
        assert_eq!(config.get_or("screen", "missing", "x"), "x");
    }

    #[test]
    fn test_rejects_non_object_sections() {
        assert!(matches!(
            GameConfig::from_json_str("[1, 2]"),
            Err(ConfigError::NotSections)
        ));
        assert!(matches!(
            GameConfig::from_json_str(r#"{ "init": 3 }"#),
            Err(ConfigError::BadSection(s)) if s == "init"
        ));
    }

    #[test]
    fn test_style_fallback_chain() {
        let mut config = GameConfig::new();
        config.set("menu", "foreground", "yellow");
        config.set("styles", "foreground", "red");
        config.set("styles", "margin", "4");

        assert_eq!(config.style("menu", "foreground"), "yellow");
        assert_eq!(config.style("other", "foreground"), "red");
        assert_eq!(config.style("menu", "margin"), "4");
        assert_eq!(config.style("menu", "button-padding"), "5");
        assert_eq!(config.style("menu", "font"), "normal");
        assert_eq!(config.style("menu", "no-such-style"), "");
    }

    #[test]
    fn test_style_int_clamps_negative() {
        let mut config = GameConfig::new();
        config.set("menu", "padding", "-3");
        config.set("menu", "border", "oops");

        assert_eq!(config.style_int("menu", "padding"), 0);
        assert_eq!(config.style_int("menu", "border"), 0);
        assert_eq!(config.style_int("menu", "button-padding"), 5);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = GameConfig::new().settings();
        assert_eq!(settings.fps, DEFAULT_FPS);
        assert_eq!(settings.virtual_width, 320);
        assert_eq!(settings.virtual_height, 240);
        assert_eq!(settings.title, "Rengine");
        assert_eq!(settings.start_state, None);
    }

    #[test]
    fn test_settings_ignores_bad_fps() {
        let mut config = GameConfig::new();
        config.set("screen", "fps", "0");
        config.set("virtual", "width", "640");
        let settings = config.settings();
        assert_eq!(settings.fps, DEFAULT_FPS);
        assert_eq!(settings.virtual_width, 640);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{ "init": { "startstate": "title" } }"#).unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.settings().start_state.as_deref(), Some("title"));

        let missing = GameConfig::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
