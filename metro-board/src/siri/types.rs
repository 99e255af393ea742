//! SIRI stop-monitoring response DTOs.
//!
//! These types map the parts of a `StopMonitoring` JSON response that the
//! board reads. The upstream omits fields rather than sending nulls in
//! many cases, so almost everything is an `Option`.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::StopArrivalFeed;

use super::error::FeedError;

/// One vehicle expected at the monitored stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredStopVisit {
    /// The vehicle journey serving the stop.
    pub monitored_vehicle_journey: MonitoredVehicleJourney,
}

/// The journey of a vehicle approaching the stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredVehicleJourney {
    /// Line identifier, e.g. "N".
    pub line_ref: Option<String>,

    /// Direction identifier; "IB" for inbound.
    pub direction_ref: Option<String>,

    /// Destination of the journey.
    pub destination_name: Option<String>,

    /// The call at the monitored stop.
    pub monitored_call: Option<MonitoredCall>,
}

/// The vehicle's call at the monitored stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredCall {
    /// Destination text shown on the vehicle at this stop.
    pub destination_display: Option<String>,

    /// Real-time expected arrival (ISO 8601).
    pub expected_arrival_time: Option<String>,
}

impl MonitoredVehicleJourney {
    pub fn expected_arrival_time(&self) -> Option<&str> {
        self.monitored_call
            .as_ref()
            .and_then(|c| c.expected_arrival_time.as_deref())
    }

    /// Destination text: the call's display text, else the journey's
    /// destination name, else "Inbound".
    pub fn destination(&self) -> &str {
        self.monitored_call
            .as_ref()
            .and_then(|c| c.destination_display.as_deref())
            .filter(|s| !s.is_empty())
            .or(self.destination_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Inbound")
    }
}

/// Decode the monitored visits out of a raw stop-monitoring document.
///
/// A missing `ServiceDelivery`, `StopMonitoringDelivery` or
/// `MonitoredStopVisit` yields no visits. `StopMonitoringDelivery` may be a
/// single delivery or an array of them. Anything present but of the wrong
/// shape is a [`FeedError::Malformed`].
pub fn monitored_visits(
    document: &str,
    feed: &StopArrivalFeed,
) -> Result<Vec<MonitoredStopVisit>, FeedError> {
    let deliveries = match feed
        .as_json()
        .get("ServiceDelivery")
        .and_then(|d| d.get("StopMonitoringDelivery"))
    {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(single) => vec![single],
    };

    let mut visits = Vec::new();
    for delivery in deliveries {
        match delivery.get("MonitoredStopVisit") {
            None | Some(Value::Null) => {}
            Some(raw) => {
                let batch: Vec<MonitoredStopVisit> = serde_json::from_value(raw.clone())
                    .map_err(|e| FeedError::malformed(document, e))?;
                visits.extend(batch);
            }
        }
    }

    Ok(visits)
}
