//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::board::{BoardView, display_time};
use crate::controller::{PollState, RefreshOutcome, RefreshPath, StatusMessage};
use crate::domain::{ArrivalRecord, SnapshotSource};
use crate::siri::ErrorKind;

/// Query for a manual refresh.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    /// Which sources to try (defaults to the full selection chain)
    #[serde(default)]
    pub path: RefreshPath,
}

/// Request to save an API key.
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

/// Page visibility transition.
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// One arrival on the board.
#[derive(Debug, Serialize)]
pub struct ArrivalResult {
    pub line: String,
    pub line_color: String,
    pub destination: String,

    /// Expected arrival (RFC 3339), if the feed gave one
    pub expected_arrival: Option<String>,

    /// Whole minutes until arrival; 999 when there is no estimate
    pub minutes_until: i64,

    /// Text shown on the board, e.g. "3 minutes"
    pub display_time: String,
}

impl ArrivalResult {
    pub fn from_record(record: &ArrivalRecord) -> Self {
        Self {
            line: record.line.clone(),
            line_color: record.line_color.clone(),
            destination: record.destination.clone(),
            expected_arrival: record.expected_arrival.map(|t| t.to_rfc3339()),
            minutes_until: record.minutes_until,
            display_time: display_time(record),
        }
    }
}

/// The whole board.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub arrivals: Vec<ArrivalResult>,

    /// Placeholder text shown instead of the list
    pub message: Option<&'static str>,

    /// "Last Updated: ..." line, once something has loaded
    pub last_updated: Option<String>,

    pub status: StatusMessage,
    pub poll_state: &'static str,
    pub has_credential: bool,
}

impl BoardResponse {
    pub fn new(
        view: &BoardView,
        last_updated: Option<String>,
        status: StatusMessage,
        poll_state: PollState,
        has_credential: bool,
    ) -> Self {
        Self {
            arrivals: view.arrivals().iter().map(ArrivalResult::from_record).collect(),
            message: view.message(),
            last_updated,
            status,
            poll_state: poll_state.label(),
            has_credential,
        }
    }
}

/// Result of a manual refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// "updated", "failed" or "superseded"
    pub outcome: &'static str,

    /// Source of the snapshot now shown, when updated
    pub source: Option<SnapshotSource>,

    /// Failure class, when failed
    pub error: Option<&'static str>,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Updated(source) => Self {
                outcome: "updated",
                source: Some(source),
                error: None,
            },
            RefreshOutcome::Failed(kind) => Self {
                outcome: "failed",
                source: None,
                error: Some(error_kind_label(kind)),
            },
            RefreshOutcome::Superseded => Self {
                outcome: "superseded",
                source: None,
                error: None,
            },
        }
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NetworkFailure => "network_failure",
        ErrorKind::MissingCredential => "missing_credential",
        ErrorKind::MalformedPayload => "malformed_payload",
    }
}

/// Status line after a credential change.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub status: StatusMessage,
    pub poll_state: &'static str,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
