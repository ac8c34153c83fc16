//! Secure-coding bridge: values archive themselves field by field into a
//! keyed archive tagged with their class name, persisted as raw bytes.

use std::collections::BTreeMap;

use defaults_core::StoredValue;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{mismatch, Codec, NativeValue},
    error::CodecError,
};

/// A type that can be archived into a keyed archive and restored from one.
///
/// Decoding is class-checked: an archive written by a type with a different
/// `CLASS_NAME` is rejected rather than coerced.
pub trait SecureCoding: Sized {
    const CLASS_NAME: &'static str;

    fn encode_with(&self, archiver: &mut KeyedArchiver) -> Result<(), CodecError>;

    fn decode_with(unarchiver: &KeyedUnarchiver) -> Result<Self, CodecError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Archive {
    #[serde(rename = "$class")]
    class: String,
    #[serde(rename = "$fields")]
    fields: BTreeMap<String, StoredValue>,
}

/// Collects named fields while a value encodes itself.
#[derive(Debug, Default)]
pub struct KeyedArchiver {
    fields: BTreeMap<String, StoredValue>,
}

impl KeyedArchiver {
    pub fn encode<V: NativeValue>(&mut self, field: &str, value: &V) {
        self.fields.insert(field.to_string(), value.to_stored());
    }

    /// Archive a nested object under `field`.
    pub fn encode_object<V: SecureCoding>(
        &mut self,
        field: &str,
        value: &V,
    ) -> Result<(), CodecError> {
        let bytes = archive(value)?;
        self.fields
            .insert(field.to_string(), StoredValue::Data(bytes));
        Ok(())
    }
}

/// Read access to the fields of an archive being decoded.
#[derive(Debug)]
pub struct KeyedUnarchiver {
    fields: BTreeMap<String, StoredValue>,
}

impl KeyedUnarchiver {
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn decode<V: NativeValue>(&self, field: &str) -> Result<V, CodecError> {
        self.decode_optional(field)?
            .ok_or_else(|| CodecError::MissingField {
                field: field.to_string(),
            })
    }

    pub fn decode_optional<V: NativeValue>(&self, field: &str) -> Result<Option<V>, CodecError> {
        self.fields
            .get(field)
            .cloned()
            .map(V::from_stored)
            .transpose()
    }

    pub fn decode_object<V: SecureCoding>(&self, field: &str) -> Result<V, CodecError> {
        match self.fields.get(field) {
            Some(StoredValue::Data(bytes)) => unarchive(bytes),
            Some(other) => Err(mismatch("data", other)),
            None => Err(CodecError::MissingField {
                field: field.to_string(),
            }),
        }
    }
}

/// Archive a value into bytes.
pub fn archive<V: SecureCoding>(value: &V) -> Result<Vec<u8>, CodecError> {
    let mut archiver = KeyedArchiver::default();
    value.encode_with(&mut archiver)?;
    let archive = Archive {
        class: V::CLASS_NAME.to_string(),
        fields: archiver.fields,
    };
    serde_json::to_vec(&archive).map_err(|e| CodecError::Encode {
        reason: e.to_string(),
    })
}

/// Restore a value from bytes produced by [`archive`], checking its class.
pub fn unarchive<V: SecureCoding>(bytes: &[u8]) -> Result<V, CodecError> {
    let archive: Archive = serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
        reason: e.to_string(),
    })?;
    if archive.class != V::CLASS_NAME {
        return Err(CodecError::ClassMismatch {
            expected: V::CLASS_NAME.to_string(),
            found: archive.class,
        });
    }
    V::decode_with(&KeyedUnarchiver {
        fields: archive.fields,
    })
}

/// Bridge used by `SecureKey` and `SecureOptionalKey`.
pub struct ArchiveCodec;

impl<V: SecureCoding> Codec<V> for ArchiveCodec {
    fn encode(value: &V) -> Result<StoredValue, CodecError> {
        archive(value).map(StoredValue::Data)
    }

    fn decode(raw: StoredValue) -> Result<V, CodecError> {
        match raw {
            StoredValue::Data(bytes) => unarchive(&bytes),
            other => Err(mismatch("data", &other)),
        }
    }
}
