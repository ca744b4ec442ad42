//! Persistent key/value store shared by every game state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while saving or loading the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One namespace of string keys and values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreScope {
    values: BTreeMap<String, String>,
}

impl StoreScope {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up `key`, falling back to `default`
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Game database with a shared namespace and a per-save namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDb {
    shared: StoreScope,
    local: StoreScope,
}

impl GameDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace that outlives individual save slots
    pub fn shared(&self) -> &StoreScope {
        &self.shared
    }

    pub fn shared_mut(&mut self) -> &mut StoreScope {
        &mut self.shared
    }

    /// Namespace tied to the current save slot
    pub fn local(&self) -> &StoreScope {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut StoreScope {
        &mut self.local
    }

    /// Drop every per-save value, as when starting a new game
    pub fn clear_local(&mut self) {
        debug!(entries = self.local.len(), "Clearing local store");
        self.local.clear();
    }

    /// Write both namespaces to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = ?path, "Saved game database");
        Ok(())
    }

    /// Read both namespaces from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let db: GameDb = serde_json::from_str(&json)?;
        info!(
            path = ?path,
            shared = db.shared.len(),
            local = db.local.len(),
            "Loaded game database"
        );
        Ok(db)
    }
}
