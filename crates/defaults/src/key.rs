use std::marker::PhantomData;

use defaults_core::StoreHandle;
use tracing::warn;

use crate::{
    archive::{ArchiveCodec, SecureCoding},
    codec::{Codec, Storable},
};

/// Typed key with a default value, bridged through `V::Codec`.
///
/// Construction registers the encoded default in the store's default layer,
/// so untyped readers of the suite see it too.
#[derive(Debug, Clone)]
pub struct Key<V: Storable> {
    name: String,
    default_value: V,
    store: StoreHandle,
}

impl<V: Storable> Key<V> {
    pub fn new(name: impl Into<String>, default_value: V, store: &StoreHandle) -> Self {
        let name = name.into();
        register_default::<V::Codec, V>(store, &name, &default_value);
        Self {
            name,
            default_value,
            store: store.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &V {
        &self.default_value
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

/// Typed key without a default; reads yield `None` when nothing is stored.
#[derive(Debug, Clone)]
pub struct OptionalKey<V: Storable> {
    name: String,
    store: StoreHandle,
    _value: PhantomData<fn() -> V>,
}

impl<V: Storable> OptionalKey<V> {
    pub fn new(name: impl Into<String>, store: &StoreHandle) -> Self {
        Self {
            name: name.into(),
            store: store.clone(),
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

/// Like [`Key`], for values archived through [`SecureCoding`].
#[derive(Debug, Clone)]
pub struct SecureKey<V: SecureCoding> {
    name: String,
    default_value: V,
    store: StoreHandle,
}

impl<V: SecureCoding> SecureKey<V> {
    pub fn new(name: impl Into<String>, default_value: V, store: &StoreHandle) -> Self {
        let name = name.into();
        register_default::<ArchiveCodec, V>(store, &name, &default_value);
        Self {
            name,
            default_value,
            store: store.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &V {
        &self.default_value
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

/// Like [`OptionalKey`], for values archived through [`SecureCoding`].
#[derive(Debug, Clone)]
pub struct SecureOptionalKey<V: SecureCoding> {
    name: String,
    store: StoreHandle,
    _value: PhantomData<fn() -> V>,
}

impl<V: SecureCoding> SecureOptionalKey<V> {
    pub fn new(name: impl Into<String>, store: &StoreHandle) -> Self {
        Self {
            name: name.into(),
            store: store.clone(),
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

fn register_default<C: Codec<V>, V>(store: &StoreHandle, name: &str, value: &V) {
    let encoded = match C::encode(value) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(suite = store.suite(), key = name, %err, "default not registered");
            return;
        }
    };
    if let Err(err) = store.register_defaults([(name.to_string(), encoded)]) {
        warn!(suite = store.suite(), key = name, %err, "default not registered");
    }
}
