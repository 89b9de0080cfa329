//! Durable key-value persistence
//!
//! The engine never touches storage directly; it reads and writes through
//! [`KeyValueStore`]. Backends:
//! - [`MemoryStore`]: in-process map (native runs and tests)
//! - `platform::storage::LocalStorage`: browser LocalStorage (wasm32 only)
//!
//! Callers treat every error as recoverable: log it and carry on with
//! defaults.

use std::collections::HashMap;

use thiserror::Error;

use crate::consts::STORAGE_PREFIX;

/// Backend failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },
    #[error("stored value under '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Minimal string key-value contract
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Namespaced storage key, e.g. `swipe_nexus_high_score`
pub fn storage_key(name: &str) -> String {
    format!("{}_{}", STORAGE_PREFIX, name)
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Load a JSON value, `Ok(None)` when the key is absent
pub fn load_json<T, S>(store: &S, name: &str) -> Result<Option<T>, StoreError>
where
    T: serde::de::DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let key = storage_key(name);
    match store.get(&key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Store a value as JSON
pub fn save_json<T, S>(store: &mut S, name: &str, value: &T) -> Result<(), StoreError>
where
    T: serde::Serialize,
    S: KeyValueStore + ?Sized,
{
    let key = storage_key(name);
    let json = serde_json::to_string(value).map_err(|e| StoreError::Write {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    store.set(&key, &json)
}
