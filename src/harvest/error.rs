//! Error types for harvest invocations.
//!
//! Only fatal failures appear here. Per-file download failures are absorbed
//! by the harvest loop and never become a `HarvestError`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::storage::StorageError;

/// Fatal errors that abort a whole harvest.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// No authenticated storage client is available.
    #[error("configuration error: {reason}\n  Suggestion: {suggestion}")]
    Configuration {
        /// What is missing or invalid.
        reason: String,
        /// How to fix it.
        suggestion: &'static str,
    },

    /// The credential was rejected, while listing or while downloading.
    ///
    /// When the rejection happened mid-batch, `staging_dir` names the staging
    /// directory that was already created; it may hold files fetched before
    /// the failure and is left for the caller to clean up.
    #[error("harvest aborted{}", staging_note(.staging_dir.as_deref()))]
    Auth {
        /// The underlying auth failure.
        #[source]
        source: StorageError,
        /// Staging directory created before the failure, if any.
        staging_dir: Option<PathBuf>,
    },

    /// The folder could not be enumerated (bad path, inaccessible folder,
    /// transport failure, or a broken listing protocol).
    #[error("failed to list folder '{path}': {source}")]
    Enumeration {
        /// The canonical folder path being listed (`/` for the root).
        path: String,
        /// The underlying listing failure.
        #[source]
        source: StorageError,
    },

    /// The staging directory could not be created.
    #[error("failed to create staging directory under {parent}: {source}")]
    Staging {
        /// Parent directory the staging area was created in.
        parent: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl HarvestError {
    /// Creates the error raised when no storage client is configured.
    #[must_use]
    pub fn missing_client() -> Self {
        Self::Configuration {
            reason: "no authenticated storage client is configured".to_string(),
            suggestion: "Set DROPBOX_ACCESS_TOKEN or pass --token with a valid access token.",
        }
    }

    /// Classifies a listing failure: auth failures stay distinct from other
    /// enumeration errors.
    pub fn listing(path: impl Into<String>, source: StorageError) -> Self {
        if source.is_auth() {
            Self::Auth {
                source,
                staging_dir: None,
            }
        } else {
            Self::Enumeration {
                path: path.into(),
                source,
            }
        }
    }

    /// Creates a staging error.
    pub fn staging(parent: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Staging {
            parent: parent.into(),
            source,
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Staging directory left on disk by a failed harvest, if any.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Path> {
        match self {
            Self::Auth { staging_dir, .. } => staging_dir.as_deref(),
            _ => None,
        }
    }

    /// Returns true for auth errors.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

fn staging_note(staging_dir: Option<&Path>) -> String {
    staging_dir
        .map(|dir| format!(" (partial files left in {})", dir.display()))
        .unwrap_or_default()
}
