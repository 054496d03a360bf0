use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::traits::CacheBackend;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process cache backend. Expired entries are invisible and dropped on
/// the next write.
#[derive(Default, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    /// A TTL past the end of `Instant` never expires
    async fn store(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.load(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
