//! Push event payloads.

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::error::EventError;

/// Push event with commit information.
///
/// Every field tolerates absence or `null`; validation of what a renderable
/// push needs happens in the formatter, not during decoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEvent {
    /// Git ref that was pushed (e.g., "refs/heads/main")
    #[serde(rename = "ref", default, deserialize_with = "null_as_default")]
    pub ref_name: String,

    /// Commit SHA before the push
    #[serde(default, deserialize_with = "null_as_default")]
    pub before: String,

    /// Commit SHA after the push
    #[serde(default, deserialize_with = "null_as_default")]
    pub after: String,

    /// URL comparing `before` and `after`
    #[serde(default, deserialize_with = "null_as_default")]
    pub compare: String,

    /// Commits included in the push, oldest first
    #[serde(default, deserialize_with = "null_as_default")]
    pub commits: Vec<PushCommit>,

    /// Repository information
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository: PushRepository,

    /// Identity that performed the push
    #[serde(default, deserialize_with = "null_as_default")]
    pub pusher: PushUser,
}

impl PushEvent {
    /// Decode a push event from a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Branch name taken as the final `/`-delimited segment of the ref.
    ///
    /// `refs/heads/feature/login` yields `login`.
    pub fn branch(&self) -> &str {
        self.ref_name.rsplit('/').next().unwrap_or_default()
    }

    /// The last commit of the push, if any.
    pub fn last_commit(&self) -> Option<&PushCommit> {
        self.commits.last()
    }
}

/// Commit information from a push event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushCommit {
    /// Commit SHA
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Commit message
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    /// Web URL of the commit
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// Commit author
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: CommitAuthor,

    /// Paths added by this commit
    #[serde(default, deserialize_with = "null_as_default")]
    pub added: Vec<String>,

    /// Paths removed by this commit
    #[serde(default, deserialize_with = "null_as_default")]
    pub removed: Vec<String>,

    /// Paths modified by this commit
    #[serde(default, deserialize_with = "null_as_default")]
    pub modified: Vec<String>,
}

impl PushCommit {
    /// Commit message with a single trailing newline removed.
    pub fn trimmed_message(&self) -> &str {
        self.message
            .strip_suffix('\n')
            .unwrap_or(self.message.as_str())
    }
}

/// Author information in a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Email address
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    /// GitHub username (if available)
    #[serde(default)]
    pub username: Option<String>,
}

/// Identity that performed a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushUser {
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Email address
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    /// Profile URL
    #[serde(default, alias = "html_url", deserialize_with = "null_as_default")]
    pub url: String,

    /// Avatar image URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar_url: String,
}

impl PushUser {
    /// Check whether `author` is a different person than this pusher.
    ///
    /// An author counts as someone else only when neither the name nor the
    /// email matches.
    pub fn differs_from(&self, author: &CommitAuthor) -> bool {
        author.email != self.email && author.name != self.name
    }
}

/// Repository information carried by a push event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushRepository {
    /// Repository name including owner (e.g., "octo/repo")
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,

    /// Canonical repository URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// Project homepage
    #[serde(default, deserialize_with = "null_as_default")]
    pub homepage: String,
}

impl PushRepository {
    /// Web URL for the repository: the canonical URL, else the homepage.
    pub fn web_url(&self) -> Option<&str> {
        [self.url.as_str(), self.homepage.as_str()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
