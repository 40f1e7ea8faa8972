//! Cache key builders and TTLs.
//!
//! All cache keys used by the crate are built here so the string formats stay
//! in one place.

use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

/// Key of the cached GitHub profile in the account scope.
pub const PROFILE: &str = "me";

/// Key of the account link state in the account scope.
pub const LINK_STATE: &str = "link_state";

/// Key of the chat's code host base URL in the chat scope.
pub const SERVICE_BASE_URL: &str = "service_base_url";

/// Lifetime of a name/email to chat handle mapping.
pub const NICK_MAP_TTL: Duration = Duration::from_secs(365 * DAY);

/// Lifetime of a delivered push message record.
pub const DELIVERY_TTL: Duration = Duration::from_secs(30 * DAY);

/// Lifetime of a cached GitHub profile.
pub const PROFILE_TTL: Duration = Duration::from_secs(30 * DAY);

/// Lifetime of a stored account link state.
pub const LINK_STATE_TTL: Duration = Duration::from_secs(365 * DAY);

/// Lifetime of the recorded chat base URL.
pub const SERVICE_BASE_URL_TTL: Duration = Duration::from_secs(365 * DAY);

/// Identity mapping key for a committer name or email.
///
/// ```rust
/// assert_eq!(courier_core::keys::nick_map("a@x.com"), "nick_map_a@x.com");
/// ```
pub fn nick_map(identifier: &str) -> String {
    format!("nick_map_{}", identifier)
}

/// Delivery record key for the last commit of a push.
///
/// The same string doubles as the outbound event key so a replayed webhook
/// edits the earlier message.
pub fn commit(commit_id: &str) -> String {
    format!("commit_{}", commit_id)
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
