use defaults_core::StoreHandle;
use tracing::{debug, warn};

use crate::{
    access::write,
    archive::{ArchiveCodec, SecureCoding},
    codec::Storable,
    error::DefaultsError,
    key::{Key, OptionalKey, SecureKey, SecureOptionalKey},
};

/// Return a key to its initial state: its default for keys that have one,
/// absence for optional keys.
pub trait Reset {
    fn key_name(&self) -> &str;

    fn try_reset(&self) -> Result<(), DefaultsError>;

    fn reset(&self) {
        if let Err(err) = self.try_reset() {
            warn!(key = self.key_name(), %err, "reset failed");
        }
    }
}

impl<T: Reset + ?Sized> Reset for &T {
    fn key_name(&self) -> &str {
        (**self).key_name()
    }

    fn try_reset(&self) -> Result<(), DefaultsError> {
        (**self).try_reset()
    }
}

impl<V: Storable> Reset for Key<V> {
    fn key_name(&self) -> &str {
        self.name()
    }

    fn try_reset(&self) -> Result<(), DefaultsError> {
        write::<V::Codec, V>(self.store(), self.name(), self.default_value())
    }
}

impl<V: SecureCoding> Reset for SecureKey<V> {
    fn key_name(&self) -> &str {
        self.name()
    }

    fn try_reset(&self) -> Result<(), DefaultsError> {
        write::<ArchiveCodec, V>(self.store(), self.name(), self.default_value())
    }
}

impl<V: Storable> Reset for OptionalKey<V> {
    fn key_name(&self) -> &str {
        self.name()
    }

    fn try_reset(&self) -> Result<(), DefaultsError> {
        Ok(self.store().remove_object(self.name())?)
    }
}

impl<V: SecureCoding> Reset for SecureOptionalKey<V> {
    fn key_name(&self) -> &str {
        self.name()
    }

    fn try_reset(&self) -> Result<(), DefaultsError> {
        Ok(self.store().remove_object(self.name())?)
    }
}

/// Reset each key in order, each in its own store. A failure on one key is
/// logged and does not stop the others.
pub fn reset<'a>(keys: impl IntoIterator<Item = &'a dyn Reset>) {
    for key in keys {
        key.reset();
    }
}

/// Variadic form of [`reset`](crate::bulk::reset()).
///
/// Keys of different value types and kinds can be mixed.
#[macro_export]
macro_rules! reset {
    ($($key:expr),+ $(,)?) => {
        $crate::bulk::reset([$(&$key as &dyn $crate::bulk::Reset),+])
    };
}

/// Remove every explicitly stored entry from a suite.
///
/// The key set is snapshotted first; keys written afterwards survive.
/// Registered defaults are kept, so typed reads return defaults afterwards.
pub fn remove_all(store: &StoreHandle) {
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(err) => {
            warn!(suite = store.suite(), %err, "could not enumerate keys");
            return;
        }
    };
    debug!(suite = store.suite(), count = keys.len(), "removing all entries");
    for key in keys {
        if let Err(err) = store.remove_object(&key) {
            warn!(suite = store.suite(), %key, %err, "remove failed");
        }
    }
}

/// Like [`remove_all`], stopping at the first failure.
pub fn try_remove_all(store: &StoreHandle) -> Result<(), DefaultsError> {
    for key in store.keys()? {
        store.remove_object(&key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use defaults_core::StoredValue;

    use super::*;
    use crate::{
        access::KeyAccess,
        archive::tests::{teal, Color},
    };

    #[test]
    fn reset_restores_default_after_many_sets() {
        let store = StoreHandle::in_memory("tests");
        let count = Key::new("count", 0_i64, &store);

        count.set(5);
        count.set(9);
        count.set(-1);
        count.reset();

        assert_eq!(count.get(), 0);
        assert_eq!(
            store.persisted_object("count").expect("persisted"),
            Some(StoredValue::Integer(0))
        );
    }

    #[test]
    fn reset_clears_optional_keys() {
        let store = StoreHandle::in_memory("tests");
        let name = OptionalKey::<String>::new("name", &store);
        name.set(Some("unicorn".into()));

        name.reset();
        assert_eq!(name.get(), None);
        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn reset_macro_mixes_key_kinds() {
        let store = StoreHandle::in_memory("tests");
        let count = Key::new("count", 1_i64, &store);
        let name = OptionalKey::<String>::new("name", &store);
        let accent = SecureKey::new("accent", teal(), &store);
        let tint = SecureOptionalKey::<Color>::new("tint", &store);

        count.set(10);
        name.set(Some("x".into()));
        accent.set(Color {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
            name: None,
        });
        tint.set(Some(teal()));

        crate::reset!(count, name, accent, &tint);

        assert_eq!(count.get(), 1);
        assert_eq!(name.get(), None);
        assert_eq!(accent.get(), teal());
        assert_eq!(tint.get(), None);
    }

    #[test]
    fn reset_accepts_collections() {
        let store = StoreHandle::in_memory("tests");
        let first = Key::new("first", false, &store);
        let second = Key::new("second", true, &store);
        first.set(true);
        second.set(false);

        let keys: Vec<&dyn Reset> = vec![&first, &second];
        reset(keys);

        assert!(!first.get());
        assert!(second.get());
    }

    #[test]
    fn each_key_resets_in_its_own_store() {
        let left = StoreHandle::in_memory("left");
        let right = StoreHandle::in_memory("right");
        let a = Key::new("value", 1_i64, &left);
        let b = Key::new("value", 2_i64, &right);
        a.set(10);
        b.set(20);

        crate::reset!(a);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 20);
    }

    #[test]
    fn remove_all_empties_key_enumeration() {
        let store = StoreHandle::in_memory("tests");
        let count = Key::new("count", 3_i64, &store);
        count.set(8);
        store
            .set_object("untyped", StoredValue::Bool(true))
            .expect("set raw");

        remove_all(&store);

        assert!(store.keys().expect("keys").is_empty());
        assert_eq!(count.get(), 3, "defaults survive a wipe");
    }

    #[test]
    fn try_remove_all_leaves_other_suites_alone() {
        let store = StoreHandle::in_memory("tests");
        let other = StoreHandle::in_memory("other");
        store
            .set_object("a", StoredValue::Integer(1))
            .expect("set raw");
        other
            .set_object("b", StoredValue::Integer(2))
            .expect("set raw");

        try_remove_all(&store).expect("remove all");

        assert!(store.keys().expect("keys").is_empty());
        assert_eq!(other.keys().expect("keys"), vec!["b".to_string()]);
    }
}
