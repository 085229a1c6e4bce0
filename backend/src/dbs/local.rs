use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("Failed to write local store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Device-local key-value store kept in a single JSON file.
///
/// The file is read once on open and rewritten on every mutation. Without a
/// path the store lives in memory only.
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: RwLock<Map<String, Value>>,
}

impl LocalStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable local store {}: {}", path.display(), e);
                Map::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!("Could not read local store {}: {}", path.display(), e);
                Map::new()
            }
        };
        Self {
            path: Some(path),
            entries: RwLock::new(entries),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Map::new()),
        }
    }

    /// `None` when the key is absent or holds something that is not a `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let value = entries.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Local store entry {:?} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LocalStoreError> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    /// Read-modify-write of one entry under a single lock. An absent or
    /// malformed entry starts from `T::default()`.
    pub fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Result<R, LocalStoreError>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut value: T = match entries.get(key) {
            Some(current) => serde_json::from_value(current.clone()).unwrap_or_else(|e| {
                tracing::warn!("Replacing local store entry {:?} of unexpected shape: {}", key, e);
                T::default()
            }),
            None => T::default(),
        };
        let result = f(&mut value);
        entries.insert(key.to_string(), serde_json::to_value(&value)?);
        self.save(&entries)?;
        Ok(result)
    }

    pub fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<(), LocalStoreError> {
        if let Some(path) = &self.path {
            let content = serde_json::to_string_pretty(entries)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}
