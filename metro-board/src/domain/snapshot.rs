//! Combined snapshots of both stops' arrival feeds.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StopCode;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// Pre-generated static cache documents.
    Cache,
    /// Direct authenticated upstream fetch.
    Api,
    /// Previously persisted snapshot.
    Stored,
}

impl SnapshotSource {
    /// Label shown next to the last-updated time.
    pub fn label(self) -> &'static str {
        match self {
            SnapshotSource::Cache => "cache",
            SnapshotSource::Api => "API direct",
            SnapshotSource::Stored => "stored",
        }
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One stop's raw stop-monitoring document, exactly as fetched.
///
/// The payload is decoded into typed visits only when the board is
/// rendered, so a document of the wrong shape still makes a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopArrivalFeed(serde_json::Value);

impl StopArrivalFeed {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// One complete fetch result covering both tracked stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSnapshot {
    pub stops: BTreeMap<StopCode, StopArrivalFeed>,
    pub last_updated: DateTime<Utc>,
    pub source: SnapshotSource,
}

impl CombinedSnapshot {
    pub fn new(
        stops: BTreeMap<StopCode, StopArrivalFeed>,
        last_updated: DateTime<Utc>,
        source: SnapshotSource,
    ) -> Self {
        Self {
            stops,
            last_updated,
            source,
        }
    }

    /// The same snapshot re-tagged with a different source.
    pub fn with_source(mut self, source: SnapshotSource) -> Self {
        self.source = source;
        self
    }

    pub fn feed(&self, stop: &StopCode) -> Option<&StopArrivalFeed> {
        self.stops.get(stop)
    }
}
