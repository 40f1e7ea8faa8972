//! # Outbound Adapters
//!
//! A recording sender with edit-in-place semantics, and a sender that only
//! writes messages to the log.

use crate::outbound::{Delivery, Outbound, OutboundError, OutboundMessage};
use crate::ChatId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// A message as currently shown in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub chat: ChatId,
    pub message: OutboundMessage,
    /// Number of times the message was replaced after posting
    pub edits: u32,
}

#[derive(Default)]
struct Transcript {
    messages: Vec<PostedMessage>,
    by_event: HashMap<(ChatId, String), usize>,
}

/// Outbound sender that keeps every chat's messages in memory.
///
/// A message whose event key was already used in the same chat replaces the
/// earlier message.
#[derive(Clone, Default)]
pub struct InMemoryOutbound {
    transcript: Arc<RwLock<Transcript>>,
}

impl InMemoryOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages currently shown in `chat`, oldest first.
    pub fn messages(&self, chat: ChatId) -> Vec<PostedMessage> {
        self.transcript
            .read()
            .map(|t| {
                t.messages
                    .iter()
                    .filter(|posted| posted.chat == chat)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of distinct messages across all chats.
    pub fn len(&self) -> usize {
        self.transcript.read().map(|t| t.messages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Outbound for InMemoryOutbound {
    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<Delivery, OutboundError> {
        let mut transcript = self
            .transcript
            .write()
            .map_err(|_| OutboundError::Transport {
                message: "transcript lock poisoned".to_string(),
            })?;

        let existing = message
            .event_key
            .as_ref()
            .and_then(|key| transcript.by_event.get(&(chat, key.clone())).copied());

        if let Some(index) = existing {
            let posted = &mut transcript.messages[index];
            posted.message = message;
            posted.edits += 1;
            return Ok(Delivery::Edited);
        }

        let index = transcript.messages.len();
        if let Some(key) = &message.event_key {
            transcript.by_event.insert((chat, key.clone()), index);
        }
        transcript.messages.push(PostedMessage {
            chat,
            message,
            edits: 0,
        });
        Ok(Delivery::Posted)
    }
}

/// Outbound sender that writes each message to the log.
///
/// Used when no chat transport is configured.
#[derive(Debug, Clone, Default)]
pub struct TracingOutbound;

#[async_trait]
impl Outbound for TracingOutbound {
    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<Delivery, OutboundError> {
        info!(
            chat = %chat,
            html = message.html,
            event_key = message.event_key.as_deref().unwrap_or(""),
            text = %message.text,
            "Outbound chat message"
        );
        Ok(Delivery::Posted)
    }
}

#[cfg(test)]
#[path = "memory_outbound_tests.rs"]
mod tests;
