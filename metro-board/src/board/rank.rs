//! Arrival merge and ranking.
//!
//! Merges the two stops' feeds into one list ordered by minutes until
//! arrival, keeping only the expected inbound line at each stop.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{ArrivalRecord, CombinedSnapshot, NO_ESTIMATE_MINUTES, TrackedStop};
use crate::siri::{FeedError, MonitoredVehicleJourney, monitored_visits};

use super::config::{BoardConfig, DepartedPolicy, INBOUND};
use super::format::minutes_until;

/// Build the ranked arrival list for a snapshot.
///
/// 1. Extract each stop's visits (missing feed ⇒ no visits)
/// 2. Keep the stop's expected line travelling inbound
/// 3. Map to records, with a sentinel for visits lacking an estimate
/// 4. Concatenate, first stop of the pair first
/// 5. Stable sort by minutes until arrival
/// 6. Optionally drop leading departed records
/// 7. Truncate to `max_results`
pub fn rank_arrivals(
    snapshot: &CombinedSnapshot,
    config: &BoardConfig,
    now: DateTime<Utc>,
) -> Result<Vec<ArrivalRecord>, FeedError> {
    let mut arrivals = Vec::new();

    for stop in config.stops.iter() {
        let Some(feed) = snapshot.feed(&stop.code) else {
            continue;
        };
        let visits = monitored_visits(&format!("stop {}", stop.code), feed)?;
        arrivals.extend(
            visits
                .iter()
                .map(|v| &v.monitored_vehicle_journey)
                .filter(|journey| serves_stop(journey, stop))
                .map(|journey| to_record(journey, stop, now)),
        );
    }

    Ok(order_arrivals(arrivals, config))
}

/// Sort, trim departed vehicles and cap a merged list of records.
pub fn order_arrivals(mut arrivals: Vec<ArrivalRecord>, config: &BoardConfig) -> Vec<ArrivalRecord> {
    // `sort_by_key` is stable, so ties keep feed order.
    arrivals.sort_by_key(|a| a.minutes_until);

    if config.departed == DepartedPolicy::DropLeading {
        let departed = arrivals
            .iter()
            .take_while(|a| a.minutes_until < 0)
            .count();
        arrivals.drain(..departed);
    }

    arrivals.truncate(config.max_results);
    arrivals
}

fn serves_stop(journey: &MonitoredVehicleJourney, stop: &TrackedStop) -> bool {
    journey.line_ref.as_deref() == Some(stop.line)
        && journey.direction_ref.as_deref() == Some(INBOUND)
}

fn to_record(
    journey: &MonitoredVehicleJourney,
    stop: &TrackedStop,
    now: DateTime<Utc>,
) -> ArrivalRecord {
    let expected_arrival = journey.expected_arrival_time().and_then(|raw| {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(t) => Some(t.with_timezone(&Utc)),
            Err(e) => {
                warn!(stop = %stop.code, value = raw, error = %e, "Unparseable expected arrival time");
                None
            }
        }
    });

    let minutes_until = expected_arrival
        .map(|t| minutes_until(t, now))
        .unwrap_or(NO_ESTIMATE_MINUTES);

    ArrivalRecord {
        line: stop.line.to_string(),
        line_color: stop.line_color.to_string(),
        destination: journey.destination().to_string(),
        expected_arrival,
        minutes_until,
    }
}
