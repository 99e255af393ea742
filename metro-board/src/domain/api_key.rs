//! Upstream API credential.

use std::fmt;

/// Error returned when a submitted API key is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API key must not be blank")]
pub struct InvalidApiKey;

/// An opaque API key for the upstream real-time API.
///
/// Surrounding whitespace is trimmed; a key that is empty after trimming is
/// rejected. `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Parse a key as typed by the user.
    pub fn parse(s: &str) -> Result<Self, InvalidApiKey> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw key, for placing into a request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
