use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::value::StoredValue;

/// Errors produced by preference store backends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
    /// Persisted representation could not be read or written.
    #[error("serialization failure: {reason}")]
    Serialization { reason: String },
}

/// Contract for the persistence domain behind a `StoreHandle`.
///
/// Backends are only responsible for explicitly set values; the default layer
/// lives on the handle.
pub trait PreferenceStore: Send + Sync {
    /// Retrieve the explicitly stored value for a key, if any.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Persist a value under a key, overwriting any existing entry.
    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Remove a key and its value (idempotent).
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Snapshot of every key currently holding an explicit value.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Volatile store for tests and ephemeral suites.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<BTreeMap<String, StoredValue>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.keys().cloned().collect())
    }
}
