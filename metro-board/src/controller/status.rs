//! The credential-area status line.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Ok,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusLevel::Ok => "ok",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: &'static str,
}

impl StatusMessage {
    pub const KEY_LOADED: Self = Self::ok("API key loaded from storage");
    pub const NO_KEY: Self =
        Self::warning("No API key saved. Enter your key to enable direct fetching.");
    pub const KEY_SAVED: Self = Self::ok("API key saved");
    pub const KEY_INVALID: Self = Self::error("Please enter a valid API key");
    pub const KEY_REMOVED: Self = Self::warning("API key removed");
    pub const KEY_REQUIRED: Self = Self::error("Please enter and save your API key first");
    pub const FETCH_FAILED: Self =
        Self::error("API fetch failed. Check the server log for details.");

    const fn ok(text: &'static str) -> Self {
        Self {
            level: StatusLevel::Ok,
            text,
        }
    }

    const fn warning(text: &'static str) -> Self {
        Self {
            level: StatusLevel::Warning,
            text,
        }
    }

    const fn error(text: &'static str) -> Self {
        Self {
            level: StatusLevel::Error,
            text,
        }
    }
}
