use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A value in one of the kinds a preference store persists natively.
///
/// Anything richer is bridged into one of these by the typed layer
/// (a JSON fragment in `String`, or an archive in `Data`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Bool(bool),
    String(String),
    Integer(i64),
    /// Must be finite; NaN and infinities fail to serialize.
    Float(#[serde(serialize_with = "finite_float")] f64),
    /// Timestamps are persisted as RFC 3339.
    Date(DateTime<Utc>),
    /// Raw bytes, persisted as standard base64 by text backends.
    Data(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl StoredValue {
    /// Short name of the variant, used in mismatch errors and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Bool(_) => "bool",
            StoredValue::String(_) => "string",
            StoredValue::Integer(_) => "integer",
            StoredValue::Float(_) => "float",
            StoredValue::Date(_) => "date",
            StoredValue::Data(_) => "data",
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Bool(value) => write!(f, "{value}"),
            StoredValue::String(value) => write!(f, "{value}"),
            StoredValue::Integer(value) => write!(f, "{value}"),
            StoredValue::Float(value) => write!(f, "{value}"),
            StoredValue::Date(value) => {
                write!(f, "{}", value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            StoredValue::Data(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

fn finite_float<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "non-finite float {value} cannot be persisted"
        )));
    }
    serializer.serialize_f64(*value)
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
