//! # Request Context
//!
//! Everything an operation needs to know about where it runs: the chat, the
//! chat user who triggered it (if any), the service and the cache.

use crate::cache::{CacheScope, CacheStore, ScopedCache};
use crate::{ChatId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Static information about the running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name used in logs and messages
    pub name: String,
    /// Externally reachable base URL of the HTTP surface
    pub public_url: String,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_url: public_url.into(),
        }
    }

    /// URL the code host should post webhooks to for `chat`.
    ///
    /// ```rust
    /// use courier_core::{ChatId, ServiceInfo};
    ///
    /// let service = ServiceInfo::new("github", "https://courier.example.com/");
    /// assert_eq!(
    ///     service.webhook_url(ChatId::new(-42)),
    ///     "https://courier.example.com/webhook/-42"
    /// );
    /// ```
    pub fn webhook_url(&self, chat: ChatId) -> String {
        format!("{}/webhook/{}", self.public_url.trim_end_matches('/'), chat)
    }
}

/// Chat user that triggered the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: UserId,
    /// Chat handle without the leading `@`
    pub username: Option<String>,
}

impl ChatUser {
    pub fn new(id: UserId, username: Option<String>) -> Self {
        Self { id, username }
    }

    /// Chat handle, if the user has a non-empty one.
    pub fn handle(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(|name| name.trim_start_matches('@'))
            .filter(|name| !name.is_empty())
    }
}

/// Explicit per-operation context.
#[derive(Clone)]
pub struct Context {
    chat: ChatId,
    user: Option<ChatUser>,
    service: Arc<ServiceInfo>,
    cache: Arc<dyn CacheStore>,
}

impl Context {
    pub fn new(chat: ChatId, service: Arc<ServiceInfo>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            chat,
            user: None,
            service,
            cache,
        }
    }

    /// Attach the chat user who triggered the operation.
    pub fn with_user(mut self, user: ChatUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn user(&self) -> Option<&ChatUser> {
        self.user.as_ref()
    }

    pub fn service(&self) -> &ServiceInfo {
        &self.service
    }

    /// Cache scoped to the current chat.
    pub fn chat_cache(&self) -> ScopedCache {
        ScopedCache::new(self.cache.clone(), CacheScope::Chat(self.chat))
    }

    /// Cache scoped to the current chat user; `None` without a user.
    pub fn user_cache(&self) -> Option<ScopedCache> {
        self.user
            .as_ref()
            .map(|user| ScopedCache::new(self.cache.clone(), CacheScope::Account(user.id)))
    }

    /// Cache shared by the whole service.
    pub fn service_cache(&self) -> ScopedCache {
        ScopedCache::new(self.cache.clone(), CacheScope::Service)
    }

    /// Webhook URL for the current chat.
    pub fn webhook_url(&self) -> String {
        self.service.webhook_url(self.chat)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("chat", &self.chat)
            .field("user", &self.user)
            .field("service", &self.service.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
