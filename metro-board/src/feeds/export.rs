//! Static cache generation.
//!
//! Fetches both tracked stops from the upstream API and writes the
//! documents the static cache reader expects.

use std::path::Path;

use tracing::info;

use crate::domain::{ApiKey, CombinedSnapshot, StopPair};
use crate::siri::{FeedError, SiriClient};

use super::live::fetch_both;
use super::static_cache::{CacheMetadata, METADATA_DOCUMENT, stop_document_name};

/// Fetch both stops with `key` and write them as a static cache into `dir`.
pub async fn export_cache(
    siri: &SiriClient,
    key: &ApiKey,
    stops: &StopPair,
    dir: &Path,
) -> Result<CombinedSnapshot, FeedError> {
    let snapshot = fetch_both(siri, key, stops).await?;
    write_cache(dir, &snapshot).await?;
    Ok(snapshot)
}

/// Write a snapshot's documents into `dir`, creating it if needed.
///
/// Stop documents are written before the metadata, so a reader never sees
/// fresh metadata alongside stale stops.
pub(crate) async fn write_cache(dir: &Path, snapshot: &CombinedSnapshot) -> Result<(), FeedError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FeedError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    for (stop, feed) in &snapshot.stops {
        let name = stop_document_name(stop);
        let body = serde_json::to_string_pretty(feed.as_json())
            .map_err(|e| FeedError::malformed(name.as_str(), e))?;
        write_document(dir, &name, body).await?;
    }

    let metadata = CacheMetadata {
        last_updated: snapshot.last_updated,
    };
    let body = serde_json::to_string_pretty(&metadata)
        .map_err(|e| FeedError::malformed(METADATA_DOCUMENT, e))?;
    write_document(dir, METADATA_DOCUMENT, body).await?;

    info!(
        dir = %dir.display(),
        stops = snapshot.stops.len(),
        last_updated = %snapshot.last_updated,
        "Wrote static cache"
    );
    Ok(())
}

async fn write_document(dir: &Path, name: &str, body: String) -> Result<(), FeedError> {
    let path = dir.join(name);
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| FeedError::Io { path, source })
}
