//! The rendered board.

use chrono::{DateTime, Local, Utc};
use tracing::error;

use crate::domain::{ArrivalRecord, CombinedSnapshot};

use super::config::BoardConfig;
use super::format::{SCHEDULE_UNAVAILABLE, format_minutes};
use super::rank::rank_arrivals;

/// What the arrival list area shows. Replaced as a whole on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardView {
    /// Nothing has been loaded yet.
    Loading,
    /// The ranked arrivals.
    Arrivals(Vec<ArrivalRecord>),
    /// Data loaded, but no matching vehicles.
    NoArrivals,
    /// The snapshot covered no stops.
    NoData,
    /// The last load produced no snapshot.
    LoadFailed,
    /// The snapshot could not be decoded.
    ProcessingError,
}

impl BoardView {
    /// Render a snapshot (or its absence) as seen at `now`.
    pub fn render(
        snapshot: Option<&CombinedSnapshot>,
        config: &BoardConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(snapshot) = snapshot else {
            return BoardView::LoadFailed;
        };

        if snapshot.stops.is_empty() {
            return BoardView::NoData;
        }

        match rank_arrivals(snapshot, config, now) {
            Ok(arrivals) if arrivals.is_empty() => BoardView::NoArrivals,
            Ok(arrivals) => BoardView::Arrivals(arrivals),
            Err(e) => {
                error!(error = %e, "Error rendering combined arrival data");
                BoardView::ProcessingError
            }
        }
    }

    /// The arrivals, if any.
    pub fn arrivals(&self) -> &[ArrivalRecord] {
        match self {
            BoardView::Arrivals(list) => list,
            _ => &[],
        }
    }

    /// The placeholder text shown instead of a list.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            BoardView::Arrivals(_) => None,
            BoardView::Loading => Some("Loading arrivals..."),
            BoardView::NoArrivals => Some("No arrivals scheduled"),
            BoardView::NoData => Some("No arrival data available"),
            BoardView::LoadFailed => Some("Failed to load data"),
            BoardView::ProcessingError => Some("Error processing arrival data"),
        }
    }
}

/// Display text for an arrival record's time.
pub fn display_time(record: &ArrivalRecord) -> String {
    if record.has_estimate() {
        format_minutes(record.minutes_until)
    } else {
        SCHEDULE_UNAVAILABLE.to_string()
    }
}

/// The "Last Updated" line for a snapshot, in server-local time.
pub fn last_updated_line(snapshot: &CombinedSnapshot) -> String {
    let local = snapshot.last_updated.with_timezone(&Local);
    format!(
        "Last Updated: {} ({})",
        local.format("%-I:%M:%S %p"),
        snapshot.source.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NO_ESTIMATE_MINUTES, SnapshotSource, StopArrivalFeed, StopCode};
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn snapshot_with(doc: serde_json::Value) -> CombinedSnapshot {
        let mut stops = BTreeMap::new();
        stops.insert(StopCode::parse("14448").unwrap(), StopArrivalFeed::new(doc));
        CombinedSnapshot::new(stops, now(), SnapshotSource::Cache)
    }

    #[test]
    fn none_is_load_failed() {
        let view = BoardView::render(None, &BoardConfig::default(), now());
        assert_eq!(view, BoardView::LoadFailed);
        assert_eq!(view.message(), Some("Failed to load data"));
    }

    #[test]
    fn empty_snapshot_is_no_data() {
        let snapshot = CombinedSnapshot::new(BTreeMap::new(), now(), SnapshotSource::Api);
        let view = BoardView::render(Some(&snapshot), &BoardConfig::default(), now());
        assert_eq!(view.message(), Some("No arrival data available"));
    }

    #[test]
    fn no_matching_visits() {
        let view = BoardView::render(
            Some(&snapshot_with(json!({"ServiceDelivery": {}}))),
            &BoardConfig::default(),
            now(),
        );
        assert_eq!(view, BoardView::NoArrivals);
        assert_eq!(view.message(), Some("No arrivals scheduled"));
        assert!(view.arrivals().is_empty());
    }

    #[test]
    fn malformed_is_processing_error() {
        let view = BoardView::render(
            Some(&snapshot_with(json!({
                "ServiceDelivery": {"StopMonitoringDelivery": {"MonitoredStopVisit": [42]}}
            }))),
            &BoardConfig::default(),
            now(),
        );
        assert_eq!(view, BoardView::ProcessingError);
        assert_eq!(view.message(), Some("Error processing arrival data"));
    }

    #[test]
    fn arrivals_have_no_message() {
        let view = BoardView::render(
            Some(&snapshot_with(json!({
                "ServiceDelivery": {"StopMonitoringDelivery": {"MonitoredStopVisit": [{
                    "MonitoredVehicleJourney": {
                        "LineRef": "N",
                        "DirectionRef": "IB",
                        "MonitoredCall": {"ExpectedArrivalTime": "2025-03-01T08:02:00Z"}
                    }
                }]}}
            }))),
            &BoardConfig::default(),
            now(),
        );
        assert_eq!(view.message(), None);
        assert_eq!(view.arrivals().len(), 1);
        assert_eq!(display_time(&view.arrivals()[0]), "2 minutes");
        assert_eq!(view.arrivals()[0].destination, "Inbound");
    }

    #[test]
    fn unscheduled_record_text() {
        let record = ArrivalRecord {
            line: "J".into(),
            line_color: "#d08770".into(),
            destination: "Embarcadero".into(),
            expected_arrival: None,
            minutes_until: NO_ESTIMATE_MINUTES,
        };
        assert_eq!(display_time(&record), "Schedule unavailable");
    }

    #[test]
    fn last_updated_mentions_source() {
        let line = last_updated_line(&snapshot_with(json!({})).with_source(SnapshotSource::Api));
        assert!(line.starts_with("Last Updated: "));
        assert!(line.ends_with("(API direct)"));
    }
}
