//! Store error types.

use std::path::PathBuf;

/// Errors from reading or writing a persistent store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store file contents could not be decoded
    #[error("store {} is not valid JSON: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// A value could not be serialized for storage
    #[error("failed to serialize {key}: {message}")]
    Serialize { key: &'static str, message: String },
}
