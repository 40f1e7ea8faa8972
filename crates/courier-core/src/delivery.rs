//! # Delivery Idempotency Cache
//!
//! Remembers the text rendered for a push, keyed by the push's last commit,
//! in the chat scope. A webhook retry for the same push yields the same key,
//! which the outbound layer uses to edit the earlier message instead of
//! posting a duplicate.

use crate::keys;
use crate::Context;
use tracing::{debug, error, warn};

/// Store `text` as the delivered message for the push ending in
/// `last_commit_id`, returning the idempotency key.
///
/// A write failure is logged; the key is returned either way.
pub async fn record(ctx: &Context, last_commit_id: &str, text: &str) -> String {
    let key = keys::commit(last_commit_id);

    if let Err(e) = ctx
        .chat_cache()
        .set(&key, text, keys::DELIVERY_TTL)
        .await
    {
        error!(error = %e, key = %key, chat = %ctx.chat(), "Could not set cache");
    } else {
        debug!(key = %key, chat = %ctx.chat(), "Recorded delivered push");
    }

    key
}

/// Text previously delivered to this chat for the push ending in
/// `last_commit_id`.
pub async fn previous(ctx: &Context, last_commit_id: &str) -> Option<String> {
    let key = keys::commit(last_commit_id);
    match ctx.chat_cache().get::<String>(&key).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, key = %key, "Delivery cache read failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
