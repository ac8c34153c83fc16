//! Core abstractions for typed defaults: the stored value model, the backend
//! store contract and the shared store handle with its default layer.
//! Backends implement `PreferenceStore`; the typed key layer lives in `defaults`.

pub mod handle;
pub mod storage;
pub mod value;

pub use handle::StoreHandle;
pub use storage::{InMemoryStore, PreferenceStore, StoreError};
pub use value::StoredValue;
