//! SIRI StopMonitoring client (511.org).
//!
//! This module provides an HTTP client for the 511.org transit API's
//! `StopMonitoring` endpoint, which returns real-time predicted arrivals
//! for a single stop.
//!
//! Key characteristics of the feed:
//! - Responses are SIRI-shaped JSON under
//!   `ServiceDelivery.StopMonitoringDelivery.MonitoredStopVisit`
//! - Bodies may start with a UTF-8 byte-order mark
//! - Expected-arrival times are ISO 8601 with an offset, and may be absent

mod client;
mod error;
mod types;

pub use client::{SiriClient, SiriConfig};
pub(crate) use client::parse_document;
pub use error::{ErrorKind, FeedError};
pub use types::{MonitoredCall, MonitoredStopVisit, MonitoredVehicleJourney, monitored_visits};
