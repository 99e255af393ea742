//! Display-ready arrival records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel minutes for a visit with no expected-arrival time, so that it
/// sorts after every timed arrival.
pub const NO_ESTIMATE_MINUTES: i64 = 999;

/// One vehicle arrival, derived from a monitored visit on a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    pub line: String,
    pub line_color: String,
    pub destination: String,
    pub expected_arrival: Option<DateTime<Utc>>,
    pub minutes_until: i64,
}

impl ArrivalRecord {
    /// Whether the upstream feed gave an expected-arrival time.
    pub fn has_estimate(&self) -> bool {
        self.expected_arrival.is_some()
    }
}
