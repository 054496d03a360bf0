use std::time::Duration;

use async_trait::async_trait;
use crate::application::errors::StorageError;

/// Ephemeral key/value backend with optional per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;
    async fn store(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> Result<(), StorageError>;
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}
