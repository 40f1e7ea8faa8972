//! # Cache Store
//!
//! Scoped key-value storage with per-entry TTL.
//!
//! Values are stored as JSON so any serde type can be cached behind a
//! dyn-compatible trait. [`ScopedCache`] binds a store to one scope and adds
//! typed accessors.

use crate::{ChatId, UserId};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Namespace a cache entry lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Per chat-user entries (e.g. the linked GitHub profile)
    Account(UserId),
    /// Per chat entries (e.g. delivered push messages)
    Chat(ChatId),
    /// Entries shared by the whole service (e.g. identity mappings)
    Service,
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(user) => write!(f, "account:{}", user),
            Self::Chat(chat) => write!(f, "chat:{}", chat),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend could not complete the operation
    #[error("Cache operation failed: {message}")]
    OperationFailed { message: String },

    /// Backend is temporarily unreachable
    #[error("Cache unavailable: {message}")]
    Unavailable { message: String },

    /// Value could not be converted to or from JSON
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// TTL-governed key-value store.
///
/// `set` overwrites any existing entry; there is no delete. Expired entries
/// read as absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value; `Ok(None)` when absent or expired.
    async fn get(
        &self,
        scope: &CacheScope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, CacheError>;

    /// Write a value that expires after `ttl`.
    async fn set(
        &self,
        scope: &CacheScope,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}

/// A cache store bound to a single scope.
#[derive(Clone)]
pub struct ScopedCache {
    store: Arc<dyn CacheStore>,
    scope: CacheScope,
}

impl ScopedCache {
    pub fn new(store: Arc<dyn CacheStore>, scope: CacheScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> &CacheScope {
        &self.scope
    }

    /// Read and decode a value.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(&self.scope, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encode and write a value.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.store.set(&self.scope, key, value, ttl).await
    }
}

impl fmt::Debug for ScopedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCache")
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
