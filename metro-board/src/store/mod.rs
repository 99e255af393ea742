//! Persistence for the API key and the last fetched snapshot.

mod error;
mod kv;
mod persist;

pub use error::StoreError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persist::{BoardStore, CREDENTIAL_KEY, SNAPSHOT_AT_KEY, SNAPSHOT_KEY};
