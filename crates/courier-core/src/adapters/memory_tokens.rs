//! In-memory OAuth token store.

use crate::tokens::{TokenError, TokenSource};
use crate::UserId;
use async_trait::async_trait;
use courier_github::AccessToken;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Token store filled by the account-link endpoint.
#[derive(Clone, Default)]
pub struct InMemoryTokenSource {
    tokens: Arc<RwLock<HashMap<UserId, AccessToken>>>,
}

impl InMemoryTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the token for `user`.
    pub fn insert(&self, user: UserId, token: AccessToken) -> Result<(), TokenError> {
        self.tokens
            .write()
            .map_err(|_| TokenError::StoreFailed {
                message: "token lock poisoned".to_string(),
            })?
            .insert(user, token);
        Ok(())
    }
}

#[async_trait]
impl TokenSource for InMemoryTokenSource {
    async fn access_token(&self, user: UserId) -> Result<AccessToken, TokenError> {
        let tokens = self.tokens.read().map_err(|_| TokenError::StoreFailed {
            message: "token lock poisoned".to_string(),
        })?;

        tokens
            .get(&user)
            .cloned()
            .ok_or(TokenError::NotLinked { user })
    }
}
