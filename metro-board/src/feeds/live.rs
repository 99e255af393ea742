//! The production feed set: static cache plus upstream API.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::try_join;

use crate::domain::{ApiKey, CombinedSnapshot, SnapshotSource, StopPair};
use crate::siri::{FeedError, SiriClient};

use super::FeedSource;
use super::static_cache::StaticCache;

/// Feeds backed by the static cache and the StopMonitoring API.
#[derive(Debug, Clone)]
pub struct LiveFeeds {
    cache: StaticCache,
    siri: SiriClient,
    stops: StopPair,
}

impl LiveFeeds {
    pub fn new(cache: StaticCache, siri: SiriClient, stops: StopPair) -> Self {
        Self { cache, siri, stops }
    }
}

impl FeedSource for LiveFeeds {
    async fn fetch_cache(&self) -> Result<CombinedSnapshot, FeedError> {
        self.cache.fetch_snapshot(&self.stops).await
    }

    async fn fetch_api(&self, key: &ApiKey) -> Result<CombinedSnapshot, FeedError> {
        fetch_both(&self.siri, key, &self.stops).await
    }
}

/// Fetch both stops from the upstream API concurrently.
///
/// Both requests must succeed. The snapshot is timestamped now.
pub async fn fetch_both(
    siri: &SiriClient,
    key: &ApiKey,
    stops: &StopPair,
) -> Result<CombinedSnapshot, FeedError> {
    let first = &stops.first().code;
    let second = &stops.second().code;

    let (first_feed, second_feed) = try_join(
        siri.stop_monitoring(key, first),
        siri.stop_monitoring(key, second),
    )
    .await?;

    let mut feeds = BTreeMap::new();
    feeds.insert(first.clone(), first_feed);
    feeds.insert(second.clone(), second_feed);

    Ok(CombinedSnapshot::new(feeds, Utc::now(), SnapshotSource::Api))
}
