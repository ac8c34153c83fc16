//! Strongly-typed access to a key-value preference suite.
//!
//! Keys carry their name, value type and (optionally) a default; reads and
//! writes go through a bridge chosen by the value type, so the suite only ever
//! sees natively storable values.
//!
//! ```
//! use defaults::{reset, Key, KeyAccess, OptionalKey, StoreHandle};
//!
//! let store = StoreHandle::in_memory("com.example.app");
//! let count = Key::new("count", 0_i64, &store);
//! let name = OptionalKey::<String>::new("name", &store);
//!
//! count.set(5);
//! name.set(Some("unicorn".to_string()));
//! assert_eq!(count.get(), 5);
//!
//! reset!(count, name);
//! assert_eq!(count.get(), 0);
//! assert_eq!(name.get(), None);
//! ```

pub mod access;
pub mod archive;
pub mod bulk;
pub mod codec;
pub mod error;
pub mod key;

pub use access::KeyAccess;
pub use archive::{KeyedArchiver, KeyedUnarchiver, SecureCoding};
pub use bulk::{remove_all, try_remove_all, Reset};
pub use codec::{Data, NativeValue, Storable};
pub use defaults_core::{InMemoryStore, PreferenceStore, StoreError, StoreHandle, StoredValue};
pub use error::{CodecError, DefaultsError};
pub use key::{Key, OptionalKey, SecureKey, SecureOptionalKey};
