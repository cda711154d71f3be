//! # Error Types
//!
//! Errors raised by the resolve → digest → build → render pipeline.
//! Almost every variant originates in the resolver or the digest cache;
//! building is infallible and rendering only fails if serde does.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from artifact resolution and integrity attestation.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The expected artifact file is not present under the updates root.
    ///
    /// Deterministic for the current directory contents; callers should not
    /// retry.
    #[error("update artifact not found: {file_name}")]
    NotFound {
        /// The exact file name the naming policy produced.
        file_name: String,
    },

    /// A requested download name is not a single plain path component.
    #[error("invalid artifact file name: {0:?}")]
    InvalidFileName(String),

    /// Reading artifact metadata or content failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read when the failure occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Digest computation exceeded its size-proportional deadline.
    #[error("digest of {} did not finish within {budget:?}", path.display())]
    DigestTimeout {
        /// File being hashed.
        path: PathBuf,
        /// Time budget that was exceeded.
        budget: Duration,
    },

    /// Structured serialization of a manifest failed.
    #[error("manifest serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UpdateError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error represents a definitive "no such artifact" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidFileName(_))
    }
}
