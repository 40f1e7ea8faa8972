//! OAuth token lookup for linked accounts.

use crate::UserId;
use async_trait::async_trait;
use courier_github::AccessToken;
use thiserror::Error;

/// Errors resolving an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The chat user never linked a GitHub account
    #[error("No GitHub account linked for user {user}")]
    NotLinked { user: UserId },

    #[error("Token store failure: {message}")]
    StoreFailed { message: String },
}

/// Source of GitHub access tokens for chat users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self, user: UserId) -> Result<AccessToken, TokenError>;
}
