//! Error types for GitHub operations.
//!
//! API failures carry enough classification for the job scheduler to decide
//! whether a retry is worthwhile.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors during GitHub API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitHub API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Rate limit exceeded. Operations should wait until reset time.
    #[error("Rate limit exceeded. Reset at: {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    /// Request to GitHub API timed out.
    #[error("Request timeout")]
    Timeout,

    /// The configured API base URL cannot be used to build a request.
    #[error("Invalid API URL: {message}")]
    InvalidUrl { message: String },

    /// Authentication to GitHub API failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Authorization check failed (insufficient permissions).
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// Failed to parse JSON response from GitHub API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimitExceeded { .. } => true,
            Self::Timeout => true,
            Self::InvalidUrl { .. } => false,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }
}

/// Errors while decoding webhook event payloads.
#[derive(Debug, Error)]
pub enum EventError {
    /// The body is not valid JSON or does not match the event shape.
    #[error("Invalid event payload: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
