use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, RwLock},
};

use tracing::debug;

use crate::{
    storage::{InMemoryStore, PreferenceStore, StoreError},
    value::StoredValue,
};

/// Shared handle to a named preference suite.
///
/// Cloning is cheap; every clone sees the same backend and the same default
/// layer. Registered defaults live only in memory and are consulted when the
/// backend holds no explicit value for a key.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Inner>,
}

struct Inner {
    suite: String,
    backend: Box<dyn PreferenceStore>,
    defaults: RwLock<BTreeMap<String, StoredValue>>,
}

impl StoreHandle {
    pub fn new(suite: impl Into<String>, backend: impl PreferenceStore + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                suite: suite.into(),
                backend: Box::new(backend),
                defaults: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Handle over a fresh `InMemoryStore`.
    pub fn in_memory(suite: impl Into<String>) -> Self {
        Self::new(suite, InMemoryStore::new())
    }

    pub fn suite(&self) -> &str {
        &self.inner.suite
    }

    /// Merge entries into the default layer, replacing earlier registrations
    /// of the same key.
    pub fn register_defaults(
        &self,
        defaults: impl IntoIterator<Item = (String, StoredValue)>,
    ) -> Result<(), StoreError> {
        let mut layer = self
            .inner
            .defaults
            .write()
            .map_err(|err| StoreError::Storage {
                reason: format!("lock poisoned: {err}"),
            })?;
        for (key, value) in defaults {
            debug!(suite = %self.inner.suite, %key, kind = value.kind(), "registering default");
            layer.insert(key, value);
        }
        Ok(())
    }

    /// The value registered in the default layer for a key.
    pub fn registered_default(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let layer = self
            .inner
            .defaults
            .read()
            .map_err(|err| StoreError::Storage {
                reason: format!("lock poisoned: {err}"),
            })?;
        Ok(layer.get(key).cloned())
    }

    /// Explicit value for a key, falling back to the default layer.
    pub fn object(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        match self.inner.backend.get(key)? {
            Some(value) => Ok(Some(value)),
            None => self.registered_default(key),
        }
    }

    /// Explicit value for a key, ignoring the default layer.
    pub fn persisted_object(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        self.inner.backend.get(key)
    }

    pub fn set_object(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.inner.backend.set(key, value)
    }

    pub fn remove_object(&self, key: &str) -> Result<(), StoreError> {
        self.inner.backend.remove(key)
    }

    /// Keys holding an explicit value at call time. Registered defaults are
    /// not included.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.backend.keys()
    }

    /// Every visible entry: registered defaults overlaid with explicit values.
    pub fn dictionary_representation(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        let mut merged = self
            .inner
            .defaults
            .read()
            .map_err(|err| StoreError::Storage {
                reason: format!("lock poisoned: {err}"),
            })?
            .clone();

        for key in self.inner.backend.keys()? {
            // A concurrent remove between `keys` and `get` just drops the entry.
            if let Some(value) = self.inner.backend.get(&key)? {
                merged.insert(key, value);
            }
        }
        Ok(merged)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("suite", &self.inner.suite)
            .finish_non_exhaustive()
    }
}
