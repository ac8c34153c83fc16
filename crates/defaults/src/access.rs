use defaults_core::StoreHandle;
use tracing::warn;

use crate::{
    archive::{ArchiveCodec, SecureCoding},
    codec::{Codec, Storable},
    error::DefaultsError,
    key::{Key, OptionalKey, SecureKey, SecureOptionalKey},
};

/// Typed read/write access through a key descriptor.
///
/// `get` and `set` never fail: problems are logged, reads fall back to the
/// key's default (or `None`), and failed writes leave the store untouched.
/// The `try_` forms report the underlying error instead.
pub trait KeyAccess {
    /// `V` for keys with a default, `Option<V>` for optional keys.
    type Output;

    fn name(&self) -> &str;

    fn try_get(&self) -> Result<Self::Output, DefaultsError>;

    fn try_set(&self, value: Self::Output) -> Result<(), DefaultsError>;

    fn get(&self) -> Self::Output;

    fn set(&self, value: Self::Output) {
        if let Err(err) = self.try_set(value) {
            warn!(key = self.name(), %err, "write skipped");
        }
    }
}

fn read<C: Codec<V>, V>(store: &StoreHandle, name: &str) -> Result<Option<V>, DefaultsError> {
    match store.object(name)? {
        Some(raw) => Ok(Some(C::decode(raw)?)),
        None => Ok(None),
    }
}

pub(crate) fn write<C: Codec<V>, V>(
    store: &StoreHandle,
    name: &str,
    value: &V,
) -> Result<(), DefaultsError> {
    let encoded = C::encode(value)?;
    store.set_object(name, encoded)?;
    Ok(())
}

fn write_optional<C: Codec<V>, V>(
    store: &StoreHandle,
    name: &str,
    value: Option<V>,
) -> Result<(), DefaultsError> {
    match value {
        Some(value) => write::<C, V>(store, name, &value),
        None => Ok(store.remove_object(name)?),
    }
}

fn or_absent<V>(name: &str, result: Result<Option<V>, DefaultsError>) -> Option<V> {
    result.unwrap_or_else(|err| {
        warn!(key = name, %err, "read failed, treating as absent");
        None
    })
}

impl<V: Storable + Clone> KeyAccess for Key<V> {
    type Output = V;

    fn name(&self) -> &str {
        Key::name(self)
    }

    fn try_get(&self) -> Result<V, DefaultsError> {
        let value = read::<V::Codec, V>(self.store(), self.name())?;
        Ok(value.unwrap_or_else(|| self.default_value().clone()))
    }

    fn try_set(&self, value: V) -> Result<(), DefaultsError> {
        write::<V::Codec, V>(self.store(), self.name(), &value)
    }

    fn get(&self) -> V {
        or_absent(self.name(), read::<V::Codec, V>(self.store(), self.name()))
            .unwrap_or_else(|| self.default_value().clone())
    }
}

impl<V: Storable> KeyAccess for OptionalKey<V> {
    type Output = Option<V>;

    fn name(&self) -> &str {
        OptionalKey::name(self)
    }

    fn try_get(&self) -> Result<Option<V>, DefaultsError> {
        read::<V::Codec, V>(self.store(), self.name())
    }

    fn try_set(&self, value: Option<V>) -> Result<(), DefaultsError> {
        write_optional::<V::Codec, V>(self.store(), self.name(), value)
    }

    fn get(&self) -> Option<V> {
        or_absent(self.name(), self.try_get())
    }
}

impl<V: SecureCoding + Clone> KeyAccess for SecureKey<V> {
    type Output = V;

    fn name(&self) -> &str {
        SecureKey::name(self)
    }

    fn try_get(&self) -> Result<V, DefaultsError> {
        let value = read::<ArchiveCodec, V>(self.store(), self.name())?;
        Ok(value.unwrap_or_else(|| self.default_value().clone()))
    }

    fn try_set(&self, value: V) -> Result<(), DefaultsError> {
        write::<ArchiveCodec, V>(self.store(), self.name(), &value)
    }

    fn get(&self) -> V {
        or_absent(self.name(), read::<ArchiveCodec, V>(self.store(), self.name()))
            .unwrap_or_else(|| self.default_value().clone())
    }
}

impl<V: SecureCoding> KeyAccess for SecureOptionalKey<V> {
    type Output = Option<V>;

    fn name(&self) -> &str {
        SecureOptionalKey::name(self)
    }

    fn try_get(&self) -> Result<Option<V>, DefaultsError> {
        read::<ArchiveCodec, V>(self.store(), self.name())
    }

    fn try_set(&self, value: Option<V>) -> Result<(), DefaultsError> {
        write_optional::<ArchiveCodec, V>(self.store(), self.name(), value)
    }

    fn get(&self) -> Option<V> {
        or_absent(self.name(), self.try_get())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use defaults_core::{StoreError, StoredValue};
    use defaults_storage::FileStore;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::{
        archive::tests::{teal, Color},
        codec::Data,
    };

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        height: u32,
    }

    crate::storable_json!(Window);

    #[test]
    fn count_scenario() {
        let store = StoreHandle::in_memory("tests");
        let count = Key::new("count", 0_i64, &store);

        assert_eq!(count.get(), 0);
        count.set(5);
        assert_eq!(count.get(), 5);
        assert_eq!(
            store.persisted_object("count").expect("persisted"),
            Some(StoredValue::Integer(5))
        );
    }

    #[test]
    fn optional_name_scenario() {
        let store = StoreHandle::in_memory("tests");
        let name = OptionalKey::<String>::new("name", &store);

        assert_eq!(name.get(), None);
        name.set(Some("x".to_string()));
        assert_eq!(name.get().as_deref(), Some("x"));
        name.set(None);
        assert_eq!(name.get(), None);
        assert!(store.keys().expect("keys").is_empty(), "no tombstone left");
    }

    #[test]
    fn native_values_round_trip() {
        let store = StoreHandle::in_memory("tests");
        let date = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();

        let flag = Key::new("flag", false, &store);
        let title = Key::new("title", String::new(), &store);
        let ratio = Key::new("ratio", 1.0_f64, &store);
        let small = Key::new("small", 0_i32, &store);
        let stamp = Key::new("stamp", Utc.timestamp_opt(0, 0).unwrap(), &store);
        let blob = Key::new("blob", Data::default(), &store);

        flag.set(true);
        title.set("hello".into());
        ratio.set(0.75);
        small.set(-12);
        stamp.set(date);
        blob.set(Data(vec![9, 8, 7]));

        assert!(flag.get());
        assert_eq!(title.get(), "hello");
        assert_eq!(ratio.get(), 0.75);
        assert_eq!(small.get(), -12);
        assert_eq!(stamp.get(), date);
        assert_eq!(blob.get(), Data(vec![9, 8, 7]));
    }

    #[test]
    fn json_values_round_trip() {
        let store = StoreHandle::in_memory("tests");
        let window = Key::new(
            "window",
            Window {
                width: 640,
                height: 480,
            },
            &store,
        );
        let recents = Key::new("recents", Vec::<String>::new(), &store);
        let sizes = OptionalKey::<BTreeMap<String, u32>>::new("sizes", &store);

        window.set(Window {
            width: 1024,
            height: 768,
        });
        recents.set(vec!["a.txt".into(), "b.txt".into()]);
        sizes.set(Some(BTreeMap::from([("icon".to_string(), 32)])));

        assert_eq!(window.get().width, 1024);
        assert_eq!(recents.get(), vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(sizes.get().expect("sizes")["icon"], 32);
    }

    #[test]
    fn undecodable_value_falls_back_to_default() {
        let store = StoreHandle::in_memory("tests");
        let count = Key::new("count", 7_i64, &store);
        store
            .set_object("count", StoredValue::String("seven".into()))
            .expect("set raw");

        assert_eq!(count.get(), 7);
        let err = count.try_get().expect_err("mismatch should surface");
        assert!(matches!(err, DefaultsError::Codec(_)));
    }

    #[test]
    fn undecodable_optional_reads_as_absent() {
        let store = StoreHandle::in_memory("tests");
        let window = OptionalKey::<Window>::new("window", &store);
        store
            .set_object("window", StoredValue::String("{broken".into()))
            .expect("set raw");

        assert_eq!(window.get(), None);
        assert!(window.try_get().is_err());
    }

    #[test]
    fn keys_sharing_a_name_alias_the_same_slot() {
        let store = StoreHandle::in_memory("tests");
        let as_int = Key::new("shared", 1_i64, &store);
        let as_float = OptionalKey::<f64>::new("shared", &store);
        let as_text = OptionalKey::<String>::new("shared", &store);

        as_int.set(3);
        assert_eq!(as_float.get(), Some(3.0));
        assert_eq!(as_text.get(), None);
    }

    #[test]
    fn secure_keys_archive_values() {
        let store = StoreHandle::in_memory("tests");
        let accent = SecureKey::new("accent", teal(), &store);
        let tint = SecureOptionalKey::<Color>::new("tint", &store);

        assert_eq!(accent.get(), teal());
        let red = Color {
            red: 1.0,
            green: 0.0,
            blue: 0.0,
            name: None,
        };
        accent.set(red.clone());
        assert_eq!(accent.get(), red);

        assert_eq!(tint.get(), None);
        tint.set(Some(red.clone()));
        assert_eq!(tint.get(), Some(red));
        tint.set(None);
        assert_eq!(tint.get(), None);
    }

    #[test]
    fn persists_through_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StoreHandle::new("app", FileStore::new(dir.path(), "app"));
        let window = Key::new(
            "window",
            Window {
                width: 1,
                height: 1,
            },
            &store,
        );
        window.set(Window {
            width: 300,
            height: 200,
        });

        let reopened = StoreHandle::new("app", FileStore::new(dir.path(), "app"));
        let window = Key::new(
            "window",
            Window {
                width: 1,
                height: 1,
            },
            &reopened,
        );
        assert_eq!(
            window.get(),
            Window {
                width: 300,
                height: 200
            }
        );
    }

    #[test]
    fn non_finite_float_write_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StoreHandle::new("app", FileStore::new(dir.path(), "app"));
        let count = Key::new("count", 1_i64, &store);
        let ratio = Key::new("ratio", 0.5_f64, &store);
        count.set(5);
        ratio.set(0.25);

        ratio.set(f64::NAN);
        assert!(matches!(
            ratio.try_set(f64::INFINITY),
            Err(DefaultsError::Codec(_))
        ));

        assert_eq!(ratio.get(), 0.25);
        assert_eq!(count.try_get(), Ok(5));
        count.set(9);
        assert_eq!(count.get(), 9);
    }

    #[test]
    fn non_finite_json_write_keeps_prior_value() {
        let store = StoreHandle::in_memory("tests");
        let weights = Key::new("weights", vec![1.0_f64], &store);
        weights.set(vec![2.0]);

        assert!(matches!(
            weights.try_set(vec![f64::NAN]),
            Err(DefaultsError::Codec(_))
        ));
        assert_eq!(weights.get(), vec![2.0]);
    }

    #[test]
    fn backend_failures_are_absorbed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileStore::new(dir.path(), "broken");
        std::fs::write(backend.path(), b"not json").expect("write garbage");
        let store = StoreHandle::new("broken", backend);
        let count = Key::new("count", 2_i64, &store);

        assert_eq!(count.get(), 2);
        count.set(4);
        assert!(matches!(
            count.try_set(4),
            Err(DefaultsError::Store(StoreError::Serialization { .. }))
        ));
    }
}
