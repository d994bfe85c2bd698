//! Key-value persistence for exported cards and remembered settings.
//!
//! [`MemoryStore`] is shared in-process state; [`DirectoryStore`] writes one
//! file per key. Both sit behind [`KeyValueStore`] so callers can persist the
//! last-used [`RenderConfig`] without caring where it goes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::RenderConfig;
use crate::error::CardResult;

/// Key under which the last-used settings are stored.
pub const SETTINGS_KEY: &str = "settings.json";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be used as a storage name.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal byte-oriented storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key is invalid or the backend fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key is invalid or the backend fails.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Thread-safe in-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Store that keeps each key as a file in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened directory store");
        Ok(Self { root })
    }

    /// Directory backing the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a key maps to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for keys that are empty, `.`/`..`, or
    /// contain path separators or control characters.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value)?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "stored value");
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// Persist `config` as pretty JSON under [`SETTINGS_KEY`].
///
/// # Errors
///
/// Returns an error if serialization or the store write fails.
pub fn save_settings(store: &dyn KeyValueStore, config: &RenderConfig) -> CardResult<()> {
    let json = serde_json::to_vec_pretty(config)?;
    store.set(SETTINGS_KEY, &json)?;
    Ok(())
}

/// Load previously saved settings, `None` if nothing was saved.
///
/// # Errors
///
/// Returns an error if the store read fails or the stored JSON is invalid.
pub fn load_settings(store: &dyn KeyValueStore) -> CardResult<Option<RenderConfig>> {
    match store.get(SETTINGS_KEY)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}
