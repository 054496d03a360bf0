//! Persistent storage: raw backends plus the encrypted storage facade

pub mod cipher;
pub mod encrypted;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use std::collections::HashMap;

use crate::domain::traits::Store;
use crate::application::errors::StorageError;

pub use cipher::{Envelope, EnvelopeCipher};
pub use encrypted::Storage;
pub use sqlite::SqliteStore;

/// In-process store, lost on restart
#[derive(Default, Clone)]
pub struct MemoryStore {
    kv: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.contains_key(key))
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.kv.write().await.clear();
        Ok(())
    }
}
