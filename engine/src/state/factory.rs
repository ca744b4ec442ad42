//! Construction of states from configuration

use super::{DemoState, GameState, StateError};
use crate::config::GameConfig;
use crate::scripting::{LuaState, RhaiState};
use std::collections::HashMap;
use tracing::debug;

/// Builds a native state given its name
pub type StateConstructor = Box<dyn Fn(&str) -> Box<dyn GameState>>;

/// Creates states by the `type` key of their configuration section
///
/// `lua` and `rhai` are built in; native kinds are registered by name.
pub struct StateFactory {
    native: HashMap<String, StateConstructor>,
}

impl Default for StateFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateFactory {
    /// Create a factory with the `demo` native kind registered
    pub fn new() -> Self {
        let mut factory = Self {
            native: HashMap::new(),
        };
        factory.register("demo", |name| Box::new(DemoState::new(name)));
        factory
    }

    /// Register a native state kind
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&str) -> Box<dyn GameState> + 'static,
    {
        self.native
            .insert(kind.to_ascii_lowercase(), Box::new(constructor));
    }

    /// Kind of the state named `name`
    ///
    /// An explicit `type` wins; otherwise the script extension decides.
    pub fn kind_of(&self, name: &str, config: &GameConfig) -> Result<String, StateError> {
        if !config.has_section(name) {
            return Err(StateError::UnknownState(name.to_string()));
        }
        if let Some(kind) = config.get(name, "type") {
            return Ok(kind.trim().to_ascii_lowercase());
        }
        let script = config.get(name, "script").unwrap_or("");
        let inferred = if script.ends_with(".lua") {
            "lua"
        } else if script.ends_with(".rhai") {
            "rhai"
        } else {
            ""
        };
        Ok(inferred.to_string())
    }

    /// Build an uninitialised state
    pub fn create(&self, name: &str, config: &GameConfig) -> Result<Box<dyn GameState>, StateError> {
        let kind = self.kind_of(name, config)?;
        debug!(state = name, kind = %kind, "Creating state");
        match kind.as_str() {
            "lua" => Ok(Box::new(LuaState::new(name))),
            "rhai" => Ok(Box::new(RhaiState::new(name))),
            other => match self.native.get(other) {
                Some(constructor) => Ok(constructor(name)),
                None => Err(StateError::UnknownType {
                    state: name.to_string(),
                    kind: other.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        let mut config = GameConfig::new();
        config.set("intro", "type", "Lua");
        config.set("intro", "script", "intro.lua");
        config.set("menu", "script", "menu.rhai");
        config.set("attract", "type", "demo");
        config.set("broken", "type", "cobol");
        config.set("bare", "script", "bare.txt");
        config
    }

    #[test]
    fn test_kind_resolution() {
        let factory = StateFactory::new();
        let config = config();
        assert_eq!(factory.kind_of("intro", &config).unwrap(), "lua");
        assert_eq!(factory.kind_of("menu", &config).unwrap(), "rhai");
        assert_eq!(factory.kind_of("attract", &config).unwrap(), "demo");
        assert!(matches!(
            factory.kind_of("nowhere", &config),
            Err(StateError::UnknownState(_))
        ));
    }

    #[test]
    fn test_create_by_kind() {
        let factory = StateFactory::new();
        let config = config();
        assert_eq!(factory.create("intro", &config).unwrap().name(), "intro");
        assert_eq!(factory.create("menu", &config).unwrap().name(), "menu");
        assert_eq!(factory.create("attract", &config).unwrap().name(), "attract");
        assert!(matches!(
            factory.create("broken", &config),
            Err(StateError::UnknownType { kind, .. }) if kind == "cobol"
        ));
        assert!(matches!(
            factory.create("bare", &config),
            Err(StateError::UnknownType { .. })
        ));
    }
}
