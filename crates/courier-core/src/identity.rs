//! # Identity Cache
//!
//! Maps a committer's display name or email to a chat handle so commit
//! authors can be mentioned. Mappings live in the service scope, so a handle
//! learned in one chat resolves in every chat.
//!
//! Cache failures never surface to callers: reads degrade to a miss and
//! writes are logged and dropped.

use crate::keys;
use crate::Context;
use tracing::{debug, warn};

/// Look up the chat handle for a committer.
///
/// The name is tried first; the email is tried only when the name did not
/// resolve and the email is non-empty.
pub async fn resolve(ctx: &Context, name: &str, email: &str) -> Option<String> {
    if !name.is_empty() {
        if let Some(handle) = lookup(ctx, name).await {
            return Some(handle);
        }
    }

    if !email.is_empty() {
        return lookup(ctx, email).await;
    }

    None
}

async fn lookup(ctx: &Context, identifier: &str) -> Option<String> {
    let key = keys::nick_map(identifier);
    match ctx.service_cache().get::<String>(&key).await {
        Ok(handle) => handle.filter(|h| !h.is_empty()),
        Err(e) => {
            warn!(error = %e, key = %key, "Identity cache read failed; treating as miss");
            None
        }
    }
}

/// Record that `account_name` and `account_email` belong to `handle`.
///
/// Empty identifiers are skipped; an empty handle records nothing.
pub async fn populate(ctx: &Context, account_name: &str, account_email: &str, handle: &str) {
    if handle.is_empty() {
        warn!(chat = %ctx.chat(), "No chat handle to map GitHub identity to");
        return;
    }

    for identifier in [account_name, account_email] {
        if identifier.is_empty() {
            debug!(handle = %handle, "Skipping empty GitHub identifier");
            continue;
        }

        let key = keys::nick_map(identifier);
        if let Err(e) = ctx
            .service_cache()
            .set(&key, handle, keys::NICK_MAP_TTL)
            .await
        {
            warn!(error = %e, key = %key, "Could not set cache for nick map");
        }
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
