//! Error types for rostack-exporter
//!
//! This module defines the error types used throughout the application.
//! Only identity discovery and authentication failures are fatal for a poll
//! cycle; per-service poller failures and accumulator rejections are isolated.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Identity discovery and token issuance errors
///
/// Any of these aborts the whole poll cycle: without a token and a catalog
/// there is nothing to poll.
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP client initialization failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// Identity version document missing, malformed, or without a usable version
    #[error("Identity version discovery failed: {0}")]
    Discovery(String),

    /// Network-level failure talking to the identity service
    #[error("Identity request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Token issuance returned a non-2xx status (bad credentials, locked
    /// account, expired password)
    #[error("Token issuance rejected with status {0}")]
    Rejected(u16),

    /// Token response did not carry the X-Subject-Token header
    #[error("Token response missing X-Subject-Token header")]
    MissingToken,

    /// Identity response body could not be decoded
    #[error("Malformed identity response: {0}")]
    Decode(String),
}

/// Per-service poller errors
///
/// These are isolated to the failing service: the cycle records them and the
/// sibling pollers proceed.
#[derive(Error, Debug)]
pub enum PollError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Failed to read the HTTP response
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// Service returned a non-2xx status
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// Response body was not the expected JSON shape
    #[error("JSON decode error: {0}")]
    Decode(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

impl PollError {
    /// HTTP status code carried by this error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PollError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PollError::Timeout
        } else if err.is_connect() {
            PollError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            PollError::HttpRequest(err)
        } else {
            PollError::HttpResponse(err)
        }
    }
}

/// Accumulator rejection of a single measurement
///
/// Reported to the caller but never aborts the remaining emissions.
#[derive(Error, Debug)]
pub enum EmitError {
    /// The host accumulator refused the measurement (e.g., buffer full)
    #[error("Accumulator rejected measurement '{name}': {reason}")]
    Rejected { name: String, reason: String },
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Identity authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, public_message, log_message) = match self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error",
                e.to_string(),
            ),
            AppError::Auth(e) => (StatusCode::BAD_GATEWAY, "Upstream error", e.to_string()),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error", e),
        };

        tracing::error!(status = %status, error = %log_message, "Request failed");

        (status, public_message).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_extraction() {
        assert_eq!(PollError::HttpStatus(503).http_status(), Some(503));
        assert_eq!(PollError::Timeout.http_status(), None);
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::Rejected(401);
        assert_eq!(err.to_string(), "Token issuance rejected with status 401");
    }
}
