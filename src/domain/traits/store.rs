use async_trait::async_trait;
use crate::application::errors::StorageError;

/// Store trait - raw key/value persistence backing encrypted storage
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// All keys currently held, in no particular order
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}
