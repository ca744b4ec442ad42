//! Backing stores that resource files are read from

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while resolving or decoding a resource
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("invalid resource path: {0}")]
    InvalidPath(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("{0} is not valid UTF-8 text")]
    Utf8(String),
}

/// A read-only file namespace addressed by logical paths like `gfx/tiles.png`
pub trait ResourceSource {
    /// Read the whole file at `path`
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// Whether `path` names a readable file
    fn exists(&self, path: &str) -> bool {
        self.read(path).is_ok()
    }
}

/// Normalize a logical path: forward slashes, no leading `./`
pub(crate) fn normalize(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Files under a directory on disk
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(root = ?root, "Creating directory resource source");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical path to a file under the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ResourceError> {
        let logical = normalize(path);
        if logical.is_empty() {
            return Err(ResourceError::InvalidPath(path.to_string()));
        }
        // Validate to prevent path traversal out of the root
        let relative = Path::new(&logical);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ResourceError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceSource for DirSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ResourceError::NotFound(path.to_string()))
            }
            Err(source) => Err(ResourceError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// In-memory files, for tests and embedded content
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.insert(normalize(path), contents.into());
    }

    /// Builder-style `insert`
    pub fn with(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }
}
