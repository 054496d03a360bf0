//! Ephemeral cache: typed facade plus the in-process backend

pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::errors::StorageError;
use crate::domain::traits::CacheBackend;

pub use memory::MemoryCache;

/// Expiry used when a component caches something without saying how long
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Unencrypted, expiring values. Nothing here survives a restart.
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.load(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn store<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        self.backend.store(key, value, ttl).await
    }

    pub async fn key_exists(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(key).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend.clear().await
    }

    /// Return the cached value, or run `producer`, cache its output for `ttl`
    /// and return what was stored.
    ///
    /// Not atomic: concurrent callers that miss together all run the producer
    /// and the last write wins. Producers must be idempotent.
    pub async fn fetch_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, StorageError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.load(key).await? {
            return Ok(cached);
        }

        let value = producer().await;
        self.store(key, &value, Some(ttl)).await?;
        Ok(self.load(key).await?.unwrap_or(value))
    }
}
