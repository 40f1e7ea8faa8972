//! # Courier Core
//!
//! Domain logic for Commit Courier: turning GitHub push webhooks into chat
//! messages that @-mention the people who wrote the commits.
//!
//! ## Architecture
//!
//! Every operation receives an explicit [`Context`](context::Context) naming
//! the chat, the chat user (when there is one), the service and the cache.
//! External collaborators sit behind traits:
//! - [`CacheStore`](cache::CacheStore) for TTL key-value storage
//! - [`JobScheduler`](jobs::JobScheduler) for deferred work with retries
//! - [`Outbound`](outbound::Outbound) for message transport
//! - [`RichText`](rich_text::RichText) for markup
//! - [`CodeHostClient`](courier_github::CodeHostClient) for GitHub calls
//!
//! ## Usage
//!
//! ```rust
//! use courier_core::{ChatId, UserId};
//!
//! let chat: ChatId = "-100200300".parse().unwrap();
//! assert_eq!(chat.as_i64(), -100200300);
//! assert_eq!(UserId::new(42).to_string(), "42");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod account_link;
pub mod adapters;
pub mod cache;
pub mod commands;
pub mod context;
pub mod delivery;
pub mod identity;
pub mod jobs;
pub mod keys;
pub mod mention;
pub mod outbound;
pub mod push;
pub mod rich_text;
pub mod signature;
pub mod tokens;
pub mod webhook;

pub use context::{ChatUser, Context, ServiceInfo};

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Identifier of a chat (private conversation or group).
///
/// Group chats use negative identifiers on most chat platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(i64);

impl ChatId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "integer chat id".to_string(),
                actual: s.to_string(),
            })
    }
}

/// Identifier of a chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "integer user id".to_string(),
                actual: s.to_string(),
            })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors parsing identifiers from strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got {actual}")]
    InvalidFormat { expected: String, actual: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
