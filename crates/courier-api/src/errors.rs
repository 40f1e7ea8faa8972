//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use courier_core::{
    account_link::AccountLinkError, outbound::OutboundError, webhook::WebhookError, ParseError,
};
use tracing::{error, warn};

/// Handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: malformed chat id, headers or payload
/// - `401 Unauthorized`: webhook signature missing or wrong
/// - `501 Not Implemented`: webhook event type without a handler
/// - `502 Bad Gateway`: the chat transport rejected the message
/// - `503 Service Unavailable`: transient failure, retry later
/// - `500 Internal Server Error`: unexpected failure
#[derive(Debug, thiserror::Error)]
pub enum ApiHandlerError {
    #[error("Invalid chat id: {0}")]
    InvalidChatId(#[from] ParseError),

    #[error("Webhook processing failed: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Message delivery failed: {0}")]
    Delivery(#[from] OutboundError),

    #[error("Account link failed: {0}")]
    AccountLink(#[from] AccountLinkError),

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl ApiHandlerError {
    /// Status code and whether the caller should retry.
    pub fn status(&self) -> (StatusCode, bool) {
        match self {
            Self::InvalidChatId(_) => (StatusCode::BAD_REQUEST, false),
            Self::Webhook(WebhookError::UnsupportedEventType { .. }) => {
                (StatusCode::NOT_IMPLEMENTED, false)
            }
            Self::Webhook(WebhookError::InvalidSignature(_)) => (StatusCode::UNAUTHORIZED, false),
            Self::Webhook(WebhookError::Delivery(e)) | Self::Delivery(e) => delivery_status(e),
            Self::AccountLink(AccountLinkError::Confirmation(e)) => delivery_status(e),
            Self::Webhook(_) => (StatusCode::BAD_REQUEST, false),
            Self::AccountLink(AccountLinkError::MissingUser) => (StatusCode::BAD_REQUEST, false),
            Self::InternalError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, false),
        }
    }
}

fn delivery_status(error: &OutboundError) -> (StatusCode, bool) {
    if error.is_transient() {
        (StatusCode::SERVICE_UNAVAILABLE, true)
    } else {
        (StatusCode::BAD_GATEWAY, false)
    }
}

impl IntoResponse for ApiHandlerError {
    fn into_response(self) -> Response {
        let (status, retryable) = self.status();

        let message = match &self {
            Self::InternalError { message } => {
                // Log detailed error server-side but return generic message to client
                error!(error = %message, "Internal server error occurred");
                "Internal server error occurred. Please try again later.".to_string()
            }
            other if status.is_server_error() => {
                error!(error = %other, status = status.as_u16(), "Request failed");
                other.to_string()
            }
            other => {
                warn!(error = %other, status = status.as_u16(), "Request rejected");
                other.to_string()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut response = (status, Json(body)).into_response();

        if retryable {
            if let Ok(header_value) = "60".parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
