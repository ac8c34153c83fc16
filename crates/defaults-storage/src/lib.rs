//! Concrete preference store backends.
//! Each suite is a JSON document on disk, rewritten atomically on every change.

pub mod file_store;

pub use file_store::FileStore;
