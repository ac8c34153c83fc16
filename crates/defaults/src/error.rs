use defaults_core::StoreError;
use thiserror::Error;

/// Failures converting between typed values and `StoredValue`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {reason}")]
    Encode { reason: String },
    #[error("decode failed: {reason}")]
    Decode { reason: String },
    /// The stored kind cannot represent the requested type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Secure decoding refused an archive of a different class.
    #[error("archive holds class {found}, expected {expected}")]
    ClassMismatch { expected: String, found: String },
    #[error("archive has no field {field}")]
    MissingField { field: String },
}

/// Errors surfaced by the fallible accessors (`try_get`, `try_set`, `try_reset`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefaultsError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
