//! StopMonitoring HTTP client.
//!
//! Queries the 511.org SIRI `StopMonitoring` endpoint for a single stop.
//! The API key travels as a query parameter, so it is supplied per call
//! rather than baked into the client.

use std::time::Duration;

use tracing::debug;

use crate::domain::{ApiKey, StopArrivalFeed, StopCode};

use super::error::FeedError;

/// Default base URL for the upstream transit API.
const DEFAULT_BASE_URL: &str = "https://api.511.org/transit";

/// Default operator whose stops are queried.
const DEFAULT_AGENCY: &str = "SF";

/// Configuration for the StopMonitoring client.
#[derive(Debug, Clone)]
pub struct SiriConfig {
    /// Base URL for the API (defaults to production 511.org)
    pub base_url: String,
    /// Operator / agency code
    pub agency: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SiriConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            agency: DEFAULT_AGENCY.to_string(),
            timeout_secs: 30,
        }
    }
}

impl SiriConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the agency code.
    pub fn with_agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = agency.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// StopMonitoring API client.
#[derive(Debug, Clone)]
pub struct SiriClient {
    http: reqwest::Client,
    base_url: String,
    agency: String,
}

impl SiriClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SiriConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agency: config.agency,
        })
    }

    /// URL of the StopMonitoring endpoint, without query parameters.
    pub fn endpoint(&self) -> String {
        format!("{}/StopMonitoring", self.base_url)
    }

    /// Fetch the stop-monitoring document for one stop.
    ///
    /// The body is returned as raw JSON; decoding into visits happens when
    /// the board is rendered.
    pub async fn stop_monitoring(
        &self,
        key: &ApiKey,
        stop: &StopCode,
    ) -> Result<StopArrivalFeed, FeedError> {
        let document = format!("StopMonitoring {stop}");
        debug!(stop = %stop, agency = %self.agency, "Fetching stop monitoring");

        // reqwest errors carry the URL, which carries the key.
        let response = self
            .http
            .get(self.endpoint())
            .query(&[
                ("api_key", key.expose()),
                ("agency", self.agency.as_str()),
                ("stopCode", stop.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Http(e.without_url()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FeedError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                document,
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Http(e.without_url()))?;

        parse_document(&document, &body)
    }
}

/// Parse a JSON document body, tolerating a leading byte-order mark.
pub(crate) fn parse_document(document: &str, body: &str) -> Result<StopArrivalFeed, FeedError> {
    let body = body.trim_start_matches('\u{feff}');
    serde_json::from_str(body)
        .map(StopArrivalFeed::new)
        .map_err(|e| FeedError::Malformed {
            document: document.to_string(),
            message: format!(
                "{e} (body: {})",
                body.chars().take(500).collect::<String>()
            ),
        })
}
