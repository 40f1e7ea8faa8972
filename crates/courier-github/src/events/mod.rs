//! GitHub webhook event types.
//!
//! The event type arrives in the `X-GitHub-Event` header and decides how the
//! body is decoded. Only push events carry a typed payload here; every other
//! type is kept as its raw name so callers can report it.

use serde::{Deserialize, Deserializer};
use std::fmt;

mod push;

pub use push::{CommitAuthor, PushCommit, PushEvent, PushRepository, PushUser};

/// Header carrying the webhook event type.
pub const EVENT_TYPE_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id of a webhook.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";

/// Header carrying the HMAC-SHA256 signature of the body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Discriminated webhook event type.
///
/// # Examples
///
/// ```rust
/// use courier_github::events::EventKind;
///
/// assert_eq!(EventKind::from_header("push"), EventKind::Push);
/// assert_eq!(
///     EventKind::from_header("issues"),
///     EventKind::Other("issues".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// One or more commits pushed to a ref
    Push,
    /// Any event type this crate does not decode
    Other(String),
}

impl EventKind {
    /// Classify the raw header value.
    pub fn from_header(value: &str) -> Self {
        match value.trim() {
            "push" => Self::Push,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the wire name of this event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deserialize `null` as the type's default value.
///
/// GitHub sends `null` for unset names, emails and homepages.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
