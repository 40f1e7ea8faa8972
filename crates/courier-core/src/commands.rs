//! # Chat Commands
//!
//! Handles the bot's chat commands:
//! - `start` replies with webhook setup instructions for the chat
//! - `cancel`, `clean` and `reset` reply with an acknowledgement
//!
//! Adding the bot to a group acts as `start`. The parameter `silent`
//! suppresses any command.

use crate::outbound::{Delivery, Outbound, OutboundError, OutboundMessage};
use crate::rich_text::RichText;
use crate::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Parameter that suppresses a command.
pub const SILENT_PARAM: &str = "silent";

/// Acknowledgement sent for `cancel`, `clean` and `reset`.
pub const CLEAN_REPLY: &str = "Clean";

/// A bot command parsed from message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCommand {
    /// Command name without the leading `/` or `@bot` suffix
    pub command: String,
    /// Everything after the first whitespace, trimmed
    pub param: String,
}

impl ChatCommand {
    /// Parse `/command@bot param` style text.
    ///
    /// ```rust
    /// use courier_core::commands::ChatCommand;
    ///
    /// let parsed = ChatCommand::parse("/start@courier_bot silent").unwrap();
    /// assert_eq!(parsed.command, "start");
    /// assert_eq!(parsed.param, "silent");
    /// assert!(ChatCommand::parse("hello").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start().strip_prefix('/')?;
        let (head, param) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let command = head.split('@').next().unwrap_or(head);
        if command.is_empty() {
            return None;
        }

        Some(Self {
            command: command.to_lowercase(),
            param: param.to_string(),
        })
    }
}

/// An inbound chat event relevant to command handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    /// Message text, if the event carried a message
    #[serde(default)]
    pub text: Option<String>,
    /// The bot was just added to a group chat
    #[serde(default)]
    pub bot_added_to_group: bool,
}

impl ChatUpdate {
    /// Command to run for this update, after applying the group-join and
    /// `silent` rules.
    pub fn command(&self) -> Option<ChatCommand> {
        let parsed = self.text.as_deref().and_then(ChatCommand::parse);
        let param = parsed.as_ref().map(|c| c.param.clone()).unwrap_or_default();

        let command = if self.bot_added_to_group {
            Some(ChatCommand {
                command: "start".to_string(),
                param,
            })
        } else {
            parsed
        };

        command.filter(|c| c.param != SILENT_PARAM)
    }
}

/// Build the reply for `command`, or `None` when the command is unknown.
pub fn handle_chat_command(
    ctx: &Context,
    rich: &dyn RichText,
    command: &str,
    param: &str,
) -> Option<OutboundMessage> {
    if param == SILENT_PARAM {
        return None;
    }

    match command {
        "start" => {
            let text = format!(
                "{}{}{}{}",
                rich.escape("Hi here! To setup notifications "),
                rich.bold("for this chat"),
                rich.escape(
                    " your GitHub repo, open Settings -> Webhooks and add this URL:\n"
                ),
                rich.fixed(&ctx.webhook_url())
            );
            Some(OutboundMessage::html(text))
        }
        "cancel" | "clean" | "reset" => Some(OutboundMessage::text(CLEAN_REPLY)),
        _ => None,
    }
}

/// Runs chat commands and sends their replies.
#[derive(Clone)]
pub struct CommandProcessor {
    rich: Arc<dyn RichText>,
    outbound: Arc<dyn Outbound>,
}

impl CommandProcessor {
    pub fn new(rich: Arc<dyn RichText>, outbound: Arc<dyn Outbound>) -> Self {
        Self { rich, outbound }
    }

    /// Handle an update; returns the delivery when a reply was sent.
    #[instrument(skip(self, ctx, update), fields(chat = %ctx.chat()))]
    pub async fn handle_update(
        &self,
        ctx: &Context,
        update: &ChatUpdate,
    ) -> Result<Option<Delivery>, OutboundError> {
        let Some(command) = update.command() else {
            debug!("No command to handle");
            return Ok(None);
        };

        let Some(reply) = handle_chat_command(ctx, self.rich.as_ref(), &command.command, &command.param)
        else {
            debug!(command = %command.command, "Ignoring unknown command");
            return Ok(None);
        };

        self.outbound.send(ctx.chat(), reply).await.map(Some)
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
