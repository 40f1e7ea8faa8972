//! # Courier GitHub
//!
//! GitHub-facing building blocks for Commit Courier.
//!
//! This crate provides:
//! - Typed push webhook payloads with lenient parsing of nullable fields
//! - The event-type discriminator taken from the `X-GitHub-Event` header
//! - A [`CodeHostClient`] abstraction with a `reqwest`-backed [`GitHubClient`]
//!
//! # Examples
//!
//! ## Parsing a push payload
//!
//! ```rust
//! use courier_github::events::PushEvent;
//!
//! let body = br#"{
//!     "ref": "refs/heads/main",
//!     "before": "aaaaaaaaaa1111",
//!     "after": "bbbbbbbbbb2222",
//!     "commits": [],
//!     "repository": {"full_name": "octo/repo"},
//!     "pusher": {"name": "octocat"}
//! }"#;
//!
//! let push = PushEvent::from_slice(body).unwrap();
//! assert_eq!(push.branch(), "main");
//! ```

pub mod client;
pub mod error;
pub mod events;

pub use client::{AccessToken, ClientConfig, CodeHostClient, GitHubClient, UserProfile};
pub use error::{ApiError, EventError};
pub use events::{
    CommitAuthor, EventKind, PushCommit, PushEvent, PushRepository, PushUser, EVENT_TYPE_HEADER,
};
