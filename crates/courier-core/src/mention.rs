//! Mention rendering for commit authors and pushers.

use crate::identity;
use crate::rich_text::RichText;
use crate::Context;

/// Render a person as `@handle` when the identity cache knows them, otherwise
/// as their name in bold.
pub async fn render(ctx: &Context, rich: &dyn RichText, name: &str, email: &str) -> String {
    match identity::resolve(ctx, name, email).await {
        Some(handle) => rich.escape(&format!("@{}", handle)),
        None => rich.bold(name),
    }
}
