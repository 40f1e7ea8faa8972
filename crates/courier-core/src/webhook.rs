//! # Webhook Processing
//!
//! Entry point for inbound GitHub webhooks addressed to a chat.
//!
//! The pipeline is: signature check (when a secret is configured), event
//! type dispatch on `X-GitHub-Event`, push rendering, then delivery to the
//! chat keyed by the push's idempotency key.

use crate::outbound::{Delivery, Outbound, OutboundError, OutboundMessage};
use crate::push::{PushFormatError, PushFormatter, RenderedPush};
use crate::signature::{SignatureError, SignatureValidator};
use crate::Context;
use courier_github::events::{DELIVERY_ID_HEADER, SIGNATURE_HEADER};
use courier_github::{EventKind, EVENT_TYPE_HEADER};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, Span};

/// Errors processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Handler for event type '{event_type}' not implemented")]
    UnsupportedEventType { event_type: String },

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error(transparent)]
    Push(#[from] PushFormatError),

    #[error("Could not deliver message: {0}")]
    Delivery(#[from] OutboundError),
}

impl WebhookError {
    /// Whether the sender may succeed by redelivering the same webhook.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Delivery(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result of a processed webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A push was rendered and sent to the chat
    Delivered {
        rendered: RenderedPush,
        delivery: Delivery,
    },
}

/// Processes webhooks for chats.
#[derive(Clone)]
pub struct WebhookProcessor {
    formatter: PushFormatter,
    outbound: Arc<dyn Outbound>,
    signature_validator: Option<Arc<dyn SignatureValidator>>,
}

impl WebhookProcessor {
    pub fn new(formatter: PushFormatter, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            formatter,
            outbound,
            signature_validator: None,
        }
    }

    /// Require a valid `X-Hub-Signature-256` on every webhook.
    pub fn with_signature_validator(mut self, validator: Arc<dyn SignatureValidator>) -> Self {
        self.signature_validator = Some(validator);
        self
    }

    /// Process one webhook delivery.
    ///
    /// Header names are expected in lowercase.
    #[instrument(
        skip(self, ctx, headers, body),
        fields(chat = %ctx.chat(), body_len = body.len(), delivery_id = tracing::field::Empty)
    )]
    pub async fn handle_webhook(
        &self,
        ctx: &Context,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Some(validator) = &self.signature_validator {
            let signature = headers.get(SIGNATURE_HEADER).map(String::as_str);
            validator.validate_signature(body, signature).await?;
        }

        if let Some(delivery_id) = headers.get(DELIVERY_ID_HEADER) {
            Span::current().record("delivery_id", delivery_id.as_str());
        }

        // An absent header is dispatched as an empty event type.
        let event_type = headers
            .get(EVENT_TYPE_HEADER)
            .map(String::as_str)
            .unwrap_or("");

        match EventKind::from_header(event_type) {
            EventKind::Push => {
                let (rendered, delivery) = self.handle_push_webhook(ctx, body).await?;
                Ok(WebhookOutcome::Delivered { rendered, delivery })
            }
            EventKind::Other(event_type) => {
                error!(event_type = %event_type, "Handler for event type not implemented");
                Err(WebhookError::UnsupportedEventType { event_type })
            }
        }
    }

    /// Render a push body and send it to the chat.
    ///
    /// The message is keyed by the push's idempotency key so a replay edits
    /// the earlier message.
    pub async fn handle_push_webhook(
        &self,
        ctx: &Context,
        body: &[u8],
    ) -> Result<(RenderedPush, Delivery), WebhookError> {
        let rendered = self.formatter.format_payload(ctx, body).await?;

        let message =
            OutboundMessage::html(rendered.text.clone()).with_event_key(&rendered.idempotency_key);
        let delivery = self.outbound.send(ctx.chat(), message).await?;

        info!(
            key = %rendered.idempotency_key,
            delivery = ?delivery,
            "Push delivered"
        );
        Ok((rendered, delivery))
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
