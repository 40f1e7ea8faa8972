//! # Push Event Formatter
//!
//! Renders a GitHub push payload as a chat message:
//!
//! ```text
//! <pusher> <pushed> to <owner/repo/branch>
//! [<author>: ]<commit message>
//! ...
//! ```
//!
//! `pushed` links to a preview of the push, the repository/branch links to the
//! branch tree, and every commit message links to its commit. Authors are
//! listed only when someone other than the pusher contributed.

use crate::delivery;
use crate::keys;
use crate::mention;
use crate::rich_text::RichText;
use crate::Context;
use courier_github::{EventError, PushEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Length of the abbreviated commit hashes in the preview headline.
pub const SHORT_HASH_LEN: usize = 10;

/// Errors that prevent a push from being rendered.
#[derive(Debug, Error)]
pub enum PushFormatError {
    #[error("Could not parse payload: {0}")]
    PayloadParse(#[from] EventError),

    #[error("Push event contains no commits")]
    EmptyCommits,

    #[error("Commit hash '{value}' in '{field}' is shorter than 10 characters")]
    MalformedHash { field: &'static str, value: String },
}

// ============================================================================
// File change statistics
// ============================================================================

/// Accumulated path counts over all commits of a push.
///
/// Counts are summed per commit, so a path touched by two commits counts
/// twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl FileChanges {
    pub fn new(modified: usize, added: usize, removed: usize) -> Self {
        Self {
            added,
            removed,
            modified,
        }
    }

    /// One-line summary such as `2 files modified 3 removed`.
    ///
    /// Terms appear in the order modified, added, removed. Zero counts are
    /// left out and only the first term says `files`.
    ///
    /// ```rust
    /// use courier_core::push::FileChanges;
    ///
    /// assert_eq!(FileChanges::new(2, 0, 3).summary(), "2 files modified 3 removed");
    /// assert_eq!(FileChanges::new(0, 1, 0).summary(), "1 files added");
    /// assert_eq!(FileChanges::default().summary(), "");
    /// ```
    pub fn summary(&self) -> String {
        let terms = [
            (self.modified, "modified"),
            (self.added, "added"),
            (self.removed, "removed"),
        ];

        let mut summary = String::new();
        for (count, verb) in terms.into_iter().filter(|(count, _)| *count > 0) {
            if summary.is_empty() {
                summary = format!("{} files {}", count, verb);
            } else {
                summary.push_str(&format!(" {} {}", count, verb));
            }
        }
        summary
    }
}

// ============================================================================
// Preview card
// ============================================================================

/// Link preview shown for the `pushed` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewCard {
    /// e.g. `3 commits`
    pub title: String,
    /// e.g. `@aaaaaaaaaa ... @bbbbbbbbbb`
    pub headline: String,
    /// File change summary
    pub description: String,
    /// Compare URL of the push
    pub url: String,
    /// Pusher avatar URL
    pub image_url: String,
}

/// Turns a preview card into the URL behind the `pushed` link.
pub trait PreviewLinker: Send + Sync {
    fn preview_url(&self, ctx: &Context, card: &PreviewCard) -> String;
}

/// Links `pushed` straight to the compare view.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareLinker;

impl PreviewLinker for CompareLinker {
    fn preview_url(&self, _ctx: &Context, card: &PreviewCard) -> String {
        card.url.clone()
    }
}

/// Abbreviate a commit hash for display.
pub fn short_hash<'a>(field: &'static str, hash: &'a str) -> Result<&'a str, PushFormatError> {
    hash.get(..SHORT_HASH_LEN)
        .ok_or_else(|| PushFormatError::MalformedHash {
            field,
            value: hash.to_string(),
        })
}

// ============================================================================
// Formatter
// ============================================================================

/// A rendered push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPush {
    /// Message text in the formatter's markup
    pub text: String,
    /// `commit_<last commit id>`; identical for replays of the same push
    pub idempotency_key: String,
    pub preview: PreviewCard,
    /// Repository web URL, when the payload had one
    pub repository_url: Option<String>,
    pub changes: FileChanges,
    /// The same push was already delivered to this chat
    #[serde(default)]
    pub replay: bool,
}

/// Renders push events for one markup flavor.
#[derive(Clone)]
pub struct PushFormatter {
    rich: Arc<dyn RichText>,
    preview: Arc<dyn PreviewLinker>,
}

impl PushFormatter {
    pub fn new(rich: Arc<dyn RichText>, preview: Arc<dyn PreviewLinker>) -> Self {
        Self { rich, preview }
    }

    /// Decode a raw webhook body and render it.
    pub async fn format_payload(
        &self,
        ctx: &Context,
        body: &[u8],
    ) -> Result<RenderedPush, PushFormatError> {
        let push = PushEvent::from_slice(body)?;
        self.format(ctx, &push).await
    }

    /// Render a push and record it as delivered for the chat.
    #[instrument(skip(self, ctx, push), fields(chat = %ctx.chat(), repository = %push.repository.full_name))]
    pub async fn format(
        &self,
        ctx: &Context,
        push: &PushEvent,
    ) -> Result<RenderedPush, PushFormatError> {
        let rich = self.rich.as_ref();

        let repository_url = push.repository.web_url().map(str::to_string);
        match &repository_url {
            Some(url) => record_service_base_url(ctx, url).await,
            None => error!(
                repository = %push.repository.full_name,
                "GitHub webhook has no repository URL"
            ),
        }

        let branch = push.branch();

        let last_commit = push.last_commit().ok_or_else(|| {
            error!(repository = %push.repository.full_name, "Push event has empty commits");
            PushFormatError::EmptyCommits
        })?;

        let mut pusher = mention::render(ctx, rich, &push.pusher.name, &push.pusher.email).await;
        if !push.pusher.url.is_empty() {
            pusher = rich.link(&pusher, &push.pusher.url);
        }

        let multi_author = push
            .commits
            .iter()
            .any(|commit| push.pusher.differs_from(&commit.author));

        let mut changes = FileChanges::default();
        let mut body = String::new();
        for commit in &push.commits {
            if multi_author {
                let author =
                    mention::render(ctx, rich, &commit.author.name, &commit.author.email).await;
                body.push_str(&author);
                body.push_str(": ");
            }
            body.push_str(&link_or_escape(rich, commit.trimmed_message(), &commit.url));
            body.push('\n');

            changes.added += commit.added.len();
            changes.removed += commit.removed.len();
            changes.modified += commit.modified.len();
        }

        let preview = PreviewCard {
            title: format!("{} commits", push.commits.len()),
            headline: format!(
                "@{} ... @{}",
                short_hash("before", &push.before)?,
                short_hash("after", &push.after)?
            ),
            description: changes.summary(),
            url: push.compare.clone(),
            image_url: push.pusher.avatar_url.clone(),
        };
        let preview_url = self.preview.preview_url(ctx, &preview);

        let target = format!("{}/{}", push.repository.full_name, branch);
        let target = match &repository_url {
            Some(url) => {
                let tree_url = format!("{}/tree/{}", url, query_escape(branch));
                info!(url = %tree_url, "Tree URL");
                rich.link_text(&target, &tree_url)
            }
            None => rich.escape(&target),
        };

        let text = format!(
            "{} {} to {}\n{}",
            pusher,
            link_or_escape(rich, "pushed", &preview_url),
            target,
            body
        );

        let replay = delivery::previous(ctx, &last_commit.id).await.is_some();
        if replay {
            info!(commit = %last_commit.id, "Push already delivered; message will be edited");
        }
        let idempotency_key = delivery::record(ctx, &last_commit.id, &text).await;

        Ok(RenderedPush {
            text,
            idempotency_key,
            preview,
            repository_url,
            changes,
            replay,
        })
    }
}

async fn record_service_base_url(ctx: &Context, url: &str) {
    if let Err(e) = ctx
        .chat_cache()
        .set(keys::SERVICE_BASE_URL, url, keys::SERVICE_BASE_URL_TTL)
        .await
    {
        warn!(error = %e, url = %url, "Could not record service base URL");
    }
}

fn link_or_escape(rich: &dyn RichText, text: &str, url: &str) -> String {
    if url.is_empty() {
        rich.escape(text)
    } else {
        rich.link_text(text, url)
    }
}

/// Percent-encode using query-string rules (space becomes `+`).
fn query_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
