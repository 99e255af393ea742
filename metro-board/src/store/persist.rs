//! Credential and snapshot persistence.

use tracing::warn;

use crate::domain::{ApiKey, CombinedSnapshot};

use super::error::StoreError;
use super::kv::KeyValueStore;

pub const CREDENTIAL_KEY: &str = "metro-board-api-key";
pub const SNAPSHOT_KEY: &str = "metro-board-snapshot";
pub const SNAPSHOT_AT_KEY: &str = "metro-board-snapshot-at";

/// The board's view of a key-value store: one credential plus the last
/// snapshot fetched with it.
#[derive(Debug)]
pub struct BoardStore<S> {
    inner: S,
}

impl<S: KeyValueStore> BoardStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The saved API key, if any. A blank stored value counts as absent.
    pub fn credential(&self) -> Option<ApiKey> {
        self.inner
            .get(CREDENTIAL_KEY)
            .and_then(|raw| ApiKey::parse(&raw).ok())
    }

    pub fn save_credential(&mut self, key: &ApiKey) -> Result<(), StoreError> {
        self.inner.set(CREDENTIAL_KEY, key.expose().to_string())
    }

    /// Remove the key together with the snapshot fetched using it.
    ///
    /// The key goes last, so a failure part way leaves it in place and
    /// never a snapshot without its key.
    pub fn remove_credential(&mut self) -> Result<(), StoreError> {
        self.inner.remove(SNAPSHOT_KEY)?;
        self.inner.remove(SNAPSHOT_AT_KEY)?;
        self.inner.remove(CREDENTIAL_KEY)
    }

    /// The last persisted snapshot. One that no longer decodes is ignored.
    pub fn stored_snapshot(&self) -> Option<CombinedSnapshot> {
        let raw = self.inner.get(SNAPSHOT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable stored snapshot");
                None
            }
        }
    }

    pub fn store_snapshot(&mut self, snapshot: &CombinedSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot).map_err(|e| StoreError::Serialize {
            key: SNAPSHOT_KEY,
            message: e.to_string(),
        })?;
        self.inner.set(SNAPSHOT_KEY, json)?;
        self.inner
            .set(SNAPSHOT_AT_KEY, snapshot.last_updated.to_rfc3339())
    }
}
