//! Request and response bodies for the HTTP endpoints.

use courier_core::{account_link::LinkState, outbound::Delivery};
use serde::{Deserialize, Serialize};

/// Response to a webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Always `delivered`; failures use the error body
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// `posted` or `edited`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
}

/// Response to a chat update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether a reply was sent
    pub handled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Completed OAuth link reported by the chat front end.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountLinkRequest {
    pub user_id: i64,

    #[serde(default)]
    pub username: Option<String>,

    pub access_token: String,
}

/// Response to an account link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLinkResponse {
    pub state: LinkState,

    /// Id of the scheduled identity cache job, if scheduling succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

pub(crate) fn delivery_label(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Posted => "posted",
        Delivery::Edited => "edited",
    }
}
