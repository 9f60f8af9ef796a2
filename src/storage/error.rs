//! Error types for storage protocol operations.
//!
//! Every variant carries the endpoint or local path it concerns, so a message
//! read in isolation still says what failed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`StorageClient`](super::StorageClient).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The credential was rejected (expired, revoked, or lacking scope).
    #[error(
        "[AUTH] storage credential rejected (HTTP {status}) calling {endpoint}: {summary}\n  Suggestion: {suggestion}"
    )]
    AuthRejected {
        /// Endpoint that rejected the request.
        endpoint: String,
        /// The HTTP status code (401 or 403).
        status: u16,
        /// Provider error summary.
        summary: String,
        /// User-facing hint.
        suggestion: &'static str,
    },

    /// The provider answered with an error status for this request.
    ///
    /// For listings this includes `path/not_found` and malformed paths; for
    /// downloads it includes missing or restricted files.
    #[error("HTTP {status} calling {endpoint}: {summary}")]
    Api {
        /// Endpoint that failed.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
        /// Provider error summary (or a truncated response body).
        summary: String,
    },

    /// Network-level failure (DNS, connection refused, TLS, broken stream).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// Endpoint being called.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request timed out.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// Endpoint being called.
        endpoint: String,
    },

    /// A request or response body could not be (de)serialized.
    #[error("malformed payload for {endpoint}: {source}")]
    Payload {
        /// Endpoint whose payload was malformed.
        endpoint: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The listing protocol broke one of its own invariants.
    #[error("listing protocol violation: {reason}")]
    Protocol {
        /// What went wrong.
        reason: String,
    },

    /// Local file system error while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A configured endpoint base URL is not a valid absolute URL.
    #[error("invalid endpoint URL: {url}")]
    InvalidEndpoint {
        /// The rejected URL string.
        url: String,
    },
}

impl StorageError {
    /// Creates an auth-rejected error.
    pub fn auth_rejected(
        endpoint: impl Into<String>,
        status: u16,
        summary: impl Into<String>,
    ) -> Self {
        Self::AuthRejected {
            endpoint: endpoint.into(),
            status,
            summary: summary.into(),
            suggestion: "Refresh the access token (DROPBOX_ACCESS_TOKEN or --token) and retry.",
        }
    }

    /// Creates an API error.
    pub fn api(endpoint: impl Into<String>, status: u16, summary: impl Into<String>) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            status,
            summary: summary.into(),
        }
    }

    /// Creates a network error, or a timeout error when `source` timed out.
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.into(),
            }
        } else {
            Self::Network {
                endpoint: endpoint.into(),
                source,
            }
        }
    }

    /// Creates a payload error.
    pub fn payload(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Payload {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a protocol violation error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the failure means the credential itself is unusable.
    ///
    /// Auth failures are never tolerated per item.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }

    /// HTTP status behind this error, when there is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRejected { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
