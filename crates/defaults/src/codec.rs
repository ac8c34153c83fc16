//! Bridges between typed values and the kinds a store persists natively.
//!
//! Every value type picks its bridge at compile time through
//! [`Storable::Codec`]: natively storable kinds pass straight through,
//! everything else is carried as a JSON fragment in a string.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use defaults_core::StoredValue;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::CodecError;

/// Converts `V` to and from a `StoredValue`.
pub trait Codec<V> {
    fn encode(value: &V) -> Result<StoredValue, CodecError>;
    fn decode(raw: StoredValue) -> Result<V, CodecError>;
}

/// A value type usable with `Key` and `OptionalKey`.
pub trait Storable: Sized {
    type Codec: Codec<Self>;
}

/// The closed set of types a store persists without an encoding step.
pub trait NativeValue: Sized {
    fn to_stored(&self) -> StoredValue;
    fn from_stored(raw: StoredValue) -> Result<Self, CodecError>;
}

/// Raw byte buffer stored as `StoredValue::Data`.
///
/// A plain `Vec<u8>` goes through the JSON bridge like any other `Vec<T>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Data(pub Vec<u8>);

impl Data {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data(bytes)
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Passes natively storable values through unchanged.
pub struct NativeCodec;

impl<V: NativeValue> Codec<V> for NativeCodec {
    fn encode(value: &V) -> Result<StoredValue, CodecError> {
        match value.to_stored() {
            StoredValue::Float(f) if !f.is_finite() => Err(CodecError::Encode {
                reason: format!("non-finite float {f}"),
            }),
            stored => Ok(stored),
        }
    }

    fn decode(raw: StoredValue) -> Result<V, CodecError> {
        V::from_stored(raw)
    }
}

/// Stores a value as the JSON text of a one-element array with the brackets
/// stripped, so scalars such as strings and enums can be encoded as well as
/// objects.
pub struct JsonCodec;

impl<V: Serialize + DeserializeOwned> Codec<V> for JsonCodec {
    fn encode(value: &V) -> Result<StoredValue, CodecError> {
        let json = serde_json::to_string(&[value]).map_err(|e| CodecError::Encode {
            reason: e.to_string(),
        })?;
        let fragment = json
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .ok_or_else(|| CodecError::Encode {
                reason: format!("unexpected json shape: {json}"),
            })?;
        // serde_json writes non-finite floats as `null`; refuse anything that
        // would not decode back.
        serde_json::from_str::<Vec<V>>(&json).map_err(|e| CodecError::Encode {
            reason: format!("value does not survive encoding: {e}"),
        })?;
        Ok(StoredValue::String(fragment.to_string()))
    }

    fn decode(raw: StoredValue) -> Result<V, CodecError> {
        let fragment = match raw {
            StoredValue::String(fragment) => fragment,
            other => return Err(mismatch("string", &other)),
        };
        let values: Vec<V> =
            serde_json::from_str(&format!("[{fragment}]")).map_err(|e| CodecError::Decode {
                reason: e.to_string(),
            })?;
        values.into_iter().next().ok_or_else(|| CodecError::Decode {
            reason: "empty json fragment".to_string(),
        })
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &StoredValue) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

impl NativeValue for bool {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Bool(*self)
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Bool(value) => Ok(value),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl NativeValue for String {
    fn to_stored(&self) -> StoredValue {
        StoredValue::String(self.clone())
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::String(value) => Ok(value),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl NativeValue for i64 {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(*self)
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Integer(value) => Ok(value),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl NativeValue for i32 {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(i64::from(*self))
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Integer(value) => i32::try_from(value).map_err(out_of_range),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl NativeValue for u32 {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(i64::from(*self))
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Integer(value) => u32::try_from(value).map_err(out_of_range),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl NativeValue for f64 {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Float(*self)
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Float(value) => Ok(value),
            StoredValue::Integer(value) => Ok(value as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl NativeValue for f32 {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Float(f64::from(*self))
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Float(value) => Ok(value as f32),
            StoredValue::Integer(value) => Ok(value as f32),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl NativeValue for DateTime<Utc> {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Date(*self)
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Date(value) => Ok(value),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl NativeValue for Data {
    fn to_stored(&self) -> StoredValue {
        StoredValue::Data(self.0.clone())
    }

    fn from_stored(raw: StoredValue) -> Result<Self, CodecError> {
        match raw {
            StoredValue::Data(bytes) => Ok(Data(bytes)),
            other => Err(mismatch("data", &other)),
        }
    }
}

fn out_of_range(err: std::num::TryFromIntError) -> CodecError {
    CodecError::Decode {
        reason: format!("integer out of range: {err}"),
    }
}

macro_rules! storable_native {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Storable for $ty {
                type Codec = NativeCodec;
            }
        )+
    };
}

storable_native!(bool, String, i64, i32, u32, f64, f32, DateTime<Utc>, Data);

/// Opt a serde type into the JSON bridge so it can back a `Key`.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// enum Theme {
///     Light,
///     Dark,
/// }
///
/// defaults::storable_json!(Theme);
/// ```
#[macro_export]
macro_rules! storable_json {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::codec::Storable for $ty {
                type Codec = $crate::codec::JsonCodec;
            }
        )+
    };
}

impl<T: Serialize + DeserializeOwned> Storable for Vec<T> {
    type Codec = JsonCodec;
}

impl<T: Serialize + DeserializeOwned> Storable for Option<T> {
    type Codec = JsonCodec;
}

impl<T: Serialize + DeserializeOwned> Storable for BTreeMap<String, T> {
    type Codec = JsonCodec;
}

impl<T: Serialize + DeserializeOwned, S> Storable for HashMap<String, T, S>
where
    S: std::hash::BuildHasher + Default,
{
    type Codec = JsonCodec;
}

impl Storable for serde_json::Value {
    type Codec = JsonCodec;
}
