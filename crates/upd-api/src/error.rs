//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`UpdateError`] outcomes to HTTP status codes with a flat JSON body:
//!
//! ```json
//! { "error": "update file not found", "message": "update artifact not found: App-1.0.0-linux-arm64.AppImage" }
//! ```
//!
//! Error bodies are always JSON, including on the `latest.yml` endpoint.
//! Update clients are expected to retry 500s later; the underlying error text
//! is included so operators can diagnose storage faults from client logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use upd_core::UpdateError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short, stable description of the error class.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No artifact matches the request (404).
    #[error("{0}")]
    NotFound(String),

    /// Storage or task failure while attesting an artifact (500).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and error class for this error.
    fn status_and_error(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "update file not found"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_error();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "update request failed"),
            Self::NotFound(_) => tracing::info!(error = %self, "update artifact not found"),
        }

        let body = ErrorBody {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("attestation task failed: {err}"))
    }
}
