//! # Outbound Messages
//!
//! Transport-agnostic message delivery to chats.

use crate::ChatId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A message ready to be sent to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message body, marked up according to `html`
    pub text: String,
    /// Whether `text` contains HTML markup
    pub html: bool,
    /// Key identifying the event this message belongs to.
    ///
    /// A second message with the same key replaces the first one instead of
    /// being posted again.
    pub event_key: Option<String>,
}

impl OutboundMessage {
    /// Plain text message without an event key.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
            event_key: None,
        }
    }

    /// HTML message without an event key.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: true,
            event_key: None,
        }
    }

    pub fn with_event_key(mut self, key: impl Into<String>) -> Self {
        self.event_key = Some(key.into());
        self
    }
}

/// Outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A new message was posted
    Posted,
    /// An earlier message with the same event key was replaced
    Edited,
}

/// Errors delivering a message.
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("Chat {chat} rejected the message: {message}")]
    Rejected { chat: ChatId, message: String },

    #[error("Transport failure: {message}")]
    Transport { message: String },
}

impl OutboundError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Message transport to the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<Delivery, OutboundError>;
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
