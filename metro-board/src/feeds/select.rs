//! Source selection.
//!
//! Sources are tried in a fixed priority order: stored snapshot, static
//! cache, then direct upstream fetch when a key is present. There are no
//! retries; the first failure that has no further fallback is returned.

use tracing::{debug, warn};

use crate::domain::{ApiKey, CombinedSnapshot, SnapshotSource};
use crate::siri::FeedError;

use super::FeedSource;

/// Produce a snapshot for page load.
///
/// A stored snapshot wins regardless of age and is tagged `stored`.
/// Otherwise the static cache is fetched, falling back to the API when a
/// key is present.
pub async fn select_snapshot<F: FeedSource>(
    feeds: &F,
    stored: Option<CombinedSnapshot>,
    credential: Option<&ApiKey>,
) -> Result<CombinedSnapshot, FeedError> {
    if let Some(snapshot) = stored {
        debug!(last_updated = %snapshot.last_updated, "Using stored snapshot");
        return Ok(snapshot.with_source(SnapshotSource::Stored));
    }

    fetch_cache_then_api(feeds, credential).await
}

/// Fetch the static cache, falling back to the API when a key is present.
pub async fn fetch_cache_then_api<F: FeedSource>(
    feeds: &F,
    credential: Option<&ApiKey>,
) -> Result<CombinedSnapshot, FeedError> {
    match feeds.fetch_cache().await {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => {
            warn!(error = %e, "Static cache fetch failed");
            match credential {
                Some(key) => {
                    debug!("Falling back to direct API fetch");
                    feeds.fetch_api(key).await
                }
                None => Err(e),
            }
        }
    }
}

/// Fetch both stops directly from the upstream API.
pub async fn fetch_direct<F: FeedSource>(
    feeds: &F,
    credential: Option<&ApiKey>,
) -> Result<CombinedSnapshot, FeedError> {
    let key = credential.ok_or(FeedError::MissingCredential)?;
    feeds.fetch_api(key).await
}
