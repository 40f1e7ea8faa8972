//! # In-Memory Cache Store
//!
//! Thread-safe TTL cache for tests and single-instance deployments.

use crate::cache::{CacheError, CacheScope, CacheStore};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct CachedEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type EntryKey = (CacheScope, String);

/// Thread-safe in-memory cache store.
///
/// Expired entries are dropped lazily on read and in bulk by
/// [`cleanup_expired`](Self::cleanup_expired).
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<EntryKey, CachedEntry>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn cleanup_expired(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(
        &self,
        scope: &CacheScope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, CacheError> {
        let entry_key = (scope.clone(), key.to_string());
        let now = Instant::now();

        {
            let entries = self.entries.read().map_err(lock_poisoned)?;
            match entries.get(&entry_key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        } // Read lock dropped here

        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        if entries
            .get(&entry_key)
            .is_some_and(|entry| entry.is_expired(now))
        {
            entries.remove(&entry_key);
        }
        Ok(None)
    }

    async fn set(
        &self,
        scope: &CacheScope,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = CachedEntry {
            value,
            expires_at: Instant::now() + ttl,
        };

        self.entries
            .write()
            .map_err(lock_poisoned)?
            .insert((scope.clone(), key.to_string()), entry);
        Ok(())
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> CacheError {
    CacheError::OperationFailed {
        message: "cache lock poisoned".to_string(),
    }
}

#[cfg(test)]
#[path = "memory_cache_tests.rs"]
mod tests;
