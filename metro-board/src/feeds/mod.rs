//! Snapshot sources and source selection.
//!
//! A snapshot can come from three places: a previously stored snapshot,
//! the static cache, or a direct authenticated upstream fetch. The
//! [`FeedSource`] trait is the seam between selection and transport.

mod export;
mod live;
mod select;
mod static_cache;

use std::future::Future;

use crate::domain::{ApiKey, CombinedSnapshot};
use crate::siri::FeedError;

pub use export::export_cache;
pub use live::{LiveFeeds, fetch_both};
pub use select::{fetch_cache_then_api, fetch_direct, select_snapshot};
pub use static_cache::{
    CacheLocation, CacheMetadata, METADATA_DOCUMENT, StaticCache, stop_document_name,
};

/// Something that can produce a combined snapshot of both tracked stops.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch the static cache (both stops plus metadata).
    fn fetch_cache(&self) -> impl Future<Output = Result<CombinedSnapshot, FeedError>> + Send;

    /// Fetch both stops directly from the upstream API.
    fn fetch_api(
        &self,
        key: &ApiKey,
    ) -> impl Future<Output = Result<CombinedSnapshot, FeedError>> + Send;
}
