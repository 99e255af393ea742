//! Stop code types and the tracked stop pair.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// An agency-assigned stop code.
///
/// Stop codes are non-empty strings of ASCII digits. This type guarantees
/// that any `StopCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use metro_board::domain::StopCode;
///
/// let stop = StopCode::parse("14448").unwrap();
/// assert_eq!(stop.as_str(), "14448");
///
/// assert!(StopCode::parse("").is_err());
/// assert!(StopCode::parse("14a48").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(Cow<'static, str>);

const fn is_valid_code(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            return false;
        }
        i += 1;
    }
    true
}

impl StopCode {
    /// Parse a stop code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }
        if !is_valid_code(s) {
            return Err(InvalidStopCode {
                reason: "must be ASCII digits 0-9",
            });
        }
        Ok(Self(Cow::Owned(s.to_string())))
    }

    /// Build a stop code from a literal, checked at compile time when used
    /// in a const context.
    pub const fn from_static(s: &'static str) -> Self {
        assert!(is_valid_code(s), "stop code must be ASCII digits");
        Self(Cow::Borrowed(s))
    }

    /// Returns the stop code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopCode {
    type Error = InvalidStopCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(code: StopCode) -> Self {
        code.0.into_owned()
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.as_str())
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stop whose arrivals appear on the board, with the single line we
/// care about at that stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedStop {
    /// Agency stop code.
    pub code: StopCode,
    /// Line identifier (`LineRef`) kept at this stop.
    pub line: &'static str,
    /// Badge colour for the line.
    pub line_color: &'static str,
    /// Human-readable name of the line.
    pub label: &'static str,
}

/// The fixed pair of stops tracked by the board.
///
/// Exactly two stops are tracked; the pair is ordered and the first stop's
/// arrivals are merged ahead of the second's before sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPair([TrackedStop; 2]);

/// Inbound N Judah at Duboce & Church, inbound J Church at Church & Duboce.
pub const MUNI_METRO: StopPair = StopPair::new(
    TrackedStop {
        code: StopCode::from_static("14448"),
        line: "N",
        line_color: "#5e81ac",
        label: "N Judah",
    },
    TrackedStop {
        code: StopCode::from_static("17073"),
        line: "J",
        line_color: "#d08770",
        label: "J Church",
    },
);

impl StopPair {
    pub const fn new(first: TrackedStop, second: TrackedStop) -> Self {
        Self([first, second])
    }

    pub fn first(&self) -> &TrackedStop {
        &self.0[0]
    }

    pub fn second(&self) -> &TrackedStop {
        &self.0[1]
    }

    /// Both stops, in board order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedStop> {
        self.0.iter()
    }

    /// Look up a tracked stop by code.
    pub fn get(&self, code: &StopCode) -> Option<&TrackedStop> {
        self.0.iter().find(|s| &s.code == code)
    }
}

impl Default for StopPair {
    fn default() -> Self {
        MUNI_METRO
    }
}
