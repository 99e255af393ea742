//! Reader for the pre-generated static cache.
//!
//! The cache is a set of documents published next to the page:
//! `stop-<code>.json` per tracked stop, shaped like the upstream
//! stop-monitoring response, and `metadata.json` holding the time the
//! documents were generated. It can be read from a directory on disk or
//! from a base URL.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CombinedSnapshot, SnapshotSource, StopArrivalFeed, StopCode, StopPair};
use crate::siri::{FeedError, parse_document};

/// Name of the cache metadata document.
pub const METADATA_DOCUMENT: &str = "metadata.json";

/// Name of the cache document for a stop.
pub fn stop_document_name(stop: &StopCode) -> String {
    format!("stop-{stop}.json")
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub last_updated: DateTime<Utc>,
}

/// Where the static cache documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// A directory on the local filesystem.
    Directory(PathBuf),
    /// A base URL the documents are published under.
    Url(String),
}

/// Reads the static cache.
#[derive(Debug, Clone)]
pub struct StaticCache {
    location: CacheLocation,
    http: reqwest::Client,
}

impl StaticCache {
    /// Create a reader for the given location.
    pub fn new(location: CacheLocation, timeout_secs: u64) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { location, http })
    }

    /// Fetch both stop documents and the metadata document concurrently.
    ///
    /// All three must succeed; the snapshot is timestamped with the
    /// metadata's `lastUpdated` and tagged as coming from the cache.
    pub async fn fetch_snapshot(&self, stops: &StopPair) -> Result<CombinedSnapshot, FeedError> {
        let first = &stops.first().code;
        let second = &stops.second().code;

        let (first_feed, second_feed, metadata) = try_join3(
            self.read_stop(first),
            self.read_stop(second),
            self.read_metadata(),
        )
        .await?;

        let mut feeds = BTreeMap::new();
        feeds.insert(first.clone(), first_feed);
        feeds.insert(second.clone(), second_feed);

        Ok(CombinedSnapshot::new(
            feeds,
            metadata.last_updated,
            SnapshotSource::Cache,
        ))
    }

    async fn read_stop(&self, stop: &StopCode) -> Result<StopArrivalFeed, FeedError> {
        let name = stop_document_name(stop);
        let body = self.read_document(&name).await?;
        parse_document(&name, &body)
    }

    async fn read_metadata(&self) -> Result<CacheMetadata, FeedError> {
        let body = self.read_document(METADATA_DOCUMENT).await?;
        serde_json::from_str(body.trim_start_matches('\u{feff}'))
            .map_err(|e| FeedError::malformed(METADATA_DOCUMENT, e))
    }

    async fn read_document(&self, name: &str) -> Result<String, FeedError> {
        match &self.location {
            CacheLocation::Directory(dir) => {
                let path = dir.join(name);
                debug!(path = %path.display(), "Reading cache document");
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| FeedError::Io { path, source })
            }
            CacheLocation::Url(base) => {
                let url = format!("{}/{}", base.trim_end_matches('/'), name);
                debug!(url = %url, "Fetching cache document");
                let response = self.http.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FeedError::Status {
                        document: name.to_string(),
                        status: status.as_u16(),
                        message: status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string(),
                    });
                }
                Ok(response.text().await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MUNI_METRO;
    use crate::siri::ErrorKind;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn write(dir: &std::path::Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn document_names() {
        let stop = StopCode::parse("14448").unwrap();
        assert_eq!(stop_document_name(&stop), "stop-14448.json");
        assert_eq!(METADATA_DOCUMENT, "metadata.json");
    }

    #[tokio::test]
    async fn reads_complete_directory() {
        let dir = tempdir().unwrap();
        write(dir.path(), "stop-14448.json", r#"{"ServiceDelivery":{"n":1}}"#);
        write(dir.path(), "stop-17073.json", r#"{"ServiceDelivery":{"j":1}}"#);
        write(
            dir.path(),
            "metadata.json",
            r#"{"lastUpdated":"2025-03-01T08:00:00.000Z"}"#,
        );

        let cache =
            StaticCache::new(CacheLocation::Directory(dir.path().to_path_buf()), 5).unwrap();
        let snapshot = cache.fetch_snapshot(&MUNI_METRO).await.unwrap();

        assert_eq!(snapshot.source, SnapshotSource::Cache);
        assert_eq!(
            snapshot.last_updated,
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(snapshot.stops.len(), 2);
        let n = snapshot
            .feed(&StopCode::parse("14448").unwrap())
            .unwrap()
            .as_json();
        assert_eq!(n["ServiceDelivery"]["n"], 1);
    }

    #[tokio::test]
    async fn missing_document_fails_whole_fetch() {
        let dir = tempdir().unwrap();
        write(dir.path(), "stop-14448.json", "{}");
        write(
            dir.path(),
            "metadata.json",
            r#"{"lastUpdated":"2025-03-01T08:00:00Z"}"#,
        );

        let cache =
            StaticCache::new(CacheLocation::Directory(dir.path().to_path_buf()), 5).unwrap();
        let err = cache.fetch_snapshot(&MUNI_METRO).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn bad_metadata_is_malformed() {
        let dir = tempdir().unwrap();
        write(dir.path(), "stop-14448.json", "{}");
        write(dir.path(), "stop-17073.json", "{}");
        write(dir.path(), "metadata.json", r#"{"updated":"yesterday"}"#);

        let cache =
            StaticCache::new(CacheLocation::Directory(dir.path().to_path_buf()), 5).unwrap();
        let err = cache.fetch_snapshot(&MUNI_METRO).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    }

    #[test]
    fn metadata_accepts_offsets() {
        let meta: CacheMetadata =
            serde_json::from_str(r#"{"lastUpdated":"2025-03-01T00:00:00-08:00"}"#).unwrap();
        assert_eq!(
            meta.last_updated,
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
        );
    }
}
