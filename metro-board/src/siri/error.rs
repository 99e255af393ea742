//! Feed error types.

use std::path::PathBuf;

/// The three failure classes the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A fetch was rejected or returned a non-success status.
    NetworkFailure,
    /// A direct fetch was attempted with no stored API key.
    MissingCredential,
    /// A document did not parse, or had an unexpected shape.
    MalformedPayload,
}

/// Errors from fetching or decoding stop-monitoring documents.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("{document}: HTTP {status}: {message}")]
    Status {
        document: String,
        status: u16,
        message: String,
    },

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Rate limited by the upstream API
    #[error("rate limited by upstream API")]
    RateLimited,

    /// A direct fetch needs a key and none is stored
    #[error("no API key saved")]
    MissingCredential,

    /// Document did not parse or had the wrong shape
    #[error("malformed {document}: {message}")]
    Malformed { document: String, message: String },

    /// Reading or writing a cache document on disk failed
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::MissingCredential => ErrorKind::MissingCredential,
            FeedError::Malformed { .. } => ErrorKind::MalformedPayload,
            FeedError::Http(_)
            | FeedError::Status { .. }
            | FeedError::Unauthorized
            | FeedError::RateLimited
            | FeedError::Io { .. } => ErrorKind::NetworkFailure,
        }
    }

    pub(crate) fn malformed(document: impl Into<String>, message: impl ToString) -> Self {
        FeedError::Malformed {
            document: document.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::Status {
            document: "stop-14448.json".into(),
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(err.to_string(), "stop-14448.json: HTTP 404: Not Found");

        let err = FeedError::malformed("metadata.json", "missing field `lastUpdated`");
        assert_eq!(
            err.to_string(),
            "malformed metadata.json: missing field `lastUpdated`"
        );

        assert_eq!(FeedError::MissingCredential.to_string(), "no API key saved");
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            FeedError::MissingCredential.kind(),
            ErrorKind::MissingCredential
        );
        assert_eq!(FeedError::RateLimited.kind(), ErrorKind::NetworkFailure);
        assert_eq!(FeedError::Unauthorized.kind(), ErrorKind::NetworkFailure);
        assert_eq!(
            FeedError::malformed("x", "y").kind(),
            ErrorKind::MalformedPayload
        );

        let io = FeedError::Io {
            path: PathBuf::from("data/metadata.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io.kind(), ErrorKind::NetworkFailure);
        assert_eq!(io.to_string(), "data/metadata.json: gone");
    }
}
