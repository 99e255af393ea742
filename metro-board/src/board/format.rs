//! Arrival time formatting.

use chrono::{DateTime, Utc};

/// Text shown for a visit with no expected-arrival time.
pub const SCHEDULE_UNAVAILABLE: &str = "Schedule unavailable";

/// Whole minutes from `now` until `expected`, rounding halves upward.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use metro_board::board::minutes_until;
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
/// assert_eq!(minutes_until(now + Duration::seconds(90), now), 2);
/// assert_eq!(minutes_until(now + Duration::seconds(89), now), 1);
/// assert_eq!(minutes_until(now - Duration::seconds(90), now), -1);
/// ```
pub fn minutes_until(expected: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expected - now).num_milliseconds();
    (millis as f64 / 60_000.0 + 0.5).floor() as i64
}

/// Display text for a number of minutes until arrival.
pub fn format_minutes(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "Arriving now".to_string(),
        1 => "1 minute".to_string(),
        m => format!("{m} minutes"),
    }
}

/// Display text for an expected arrival seen from `now`.
pub fn format_arrival_time(expected: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_minutes(minutes_until(expected, now))
}
