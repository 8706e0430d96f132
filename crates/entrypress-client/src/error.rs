//! Fetch errors.

use std::path::PathBuf;

use entrypress_core::CoreError;
use thiserror::Error;

/// Result type for content source operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors raised while retrieving content from a source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (DNS, TLS, timeout, connection reset).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The requested content type does not exist in the source.
    #[error("content type not found: {0}")]
    NotFound(String),

    /// Reading a local content dump failed.
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] CoreError),
}

impl FetchError {
    /// HTTP status of the failed request, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "https://cdn.contentful.com/spaces/s/entries".to_string(),
            status: 401,
            message: "The access token you sent could not be found or is invalid.".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("/entries"));
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: FetchError = CoreError::missing_credential("access_token").into();
        assert!(err.to_string().starts_with("missing credential"));
        assert_eq!(err.status(), None);
    }
}
