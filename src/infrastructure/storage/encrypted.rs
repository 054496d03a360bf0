//! Encrypted, JSON-typed storage on top of any raw [`Store`]

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::cipher::{Envelope, EnvelopeCipher};
use crate::application::errors::StorageError;
use crate::domain::traits::Store;

/// Every value goes through JSON and then an encrypted envelope before it
/// reaches the backend.
pub struct Storage {
    backend: Arc<dyn Store>,
    cipher: EnvelopeCipher,
}

impl Storage {
    pub fn new(backend: Arc<dyn Store>, cipher: EnvelopeCipher) -> Self {
        Self { backend, cipher }
    }

    pub async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let plain = serde_json::to_vec(value)?;
        let envelope = self.cipher.seal(&plain)?;
        let raw = serde_json::to_string(&envelope)?;
        self.backend.set(key, &raw).await
    }

    /// `Ok(None)` when nothing is stored under `key`
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(envelope) = self.envelope(key).await? else {
            return Ok(None);
        };

        let plain = self.cipher.open(key, &envelope).map_err(|e| {
            tracing::error!("Refusing to load '{}': {}", key, e);
            e
        })?;
        Ok(Some(serde_json::from_slice(&plain)?))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend.clear().await
    }

    pub async fn key_exists(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(key).await
    }

    pub async fn each_key<F: FnMut(&str)>(&self, mut visitor: F) -> Result<(), StorageError> {
        for key in self.backend.keys().await? {
            visitor(&key);
        }
        Ok(())
    }

    /// Keys starting with `prefix`, sorted
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        self.each_key(|key| {
            if key.starts_with(prefix) {
                keys.push(key.to_string());
            }
        })
        .await?;
        keys.sort();
        Ok(keys)
    }

    pub fn current_fingerprint(&self) -> &str {
        self.cipher.fingerprint()
    }

    /// Fingerprint of the key the record under `key` was written with
    pub async fn fingerprint(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.envelope(key).await?.map(|e| e.key))
    }

    /// Diagnostics only: whether the record was sealed with the current key.
    pub async fn written_with_current_key(&self, key: &str) -> Result<Option<bool>, StorageError> {
        Ok(self.fingerprint(key).await?.map(|f| f == self.cipher.fingerprint()))
    }

    pub async fn envelope(&self, key: &str) -> Result<Option<Envelope>, StorageError> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Decryption {
                key: key.to_string(),
                reason: format!("malformed envelope: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStore;

    fn storage_with(backend: Arc<dyn Store>, secret: &str) -> Storage {
        Storage::new(backend, EnvelopeCipher::from_secret(Some(secret)))
    }

    #[tokio::test]
    async fn test_absent_key_is_none() {
        let storage = storage_with(Arc::new(MemoryStore::new()), "s");
        let value: Option<Vec<i32>> = storage.load("some_value").await.unwrap();
        assert!(value.is_none());
        assert!(storage.fingerprint("some_value").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_are_encrypted_at_rest() {
        let backend = Arc::new(MemoryStore::new());
        let storage = storage_with(backend.clone(), "s");
        storage.store("some_value", &vec![1, 2, 3, 4]).await.unwrap();

        let raw = backend.get("some_value").await.unwrap().unwrap();
        assert!(!raw.contains("[1,2,3,4]"));
        let loaded: Option<Vec<i32>> = storage.load("some_value").await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_rotated_key_is_a_hard_failure() {
        let backend: Arc<dyn Store> = Arc::new(MemoryStore::new());
        storage_with(backend.clone(), "old").store("k", "value").await.unwrap();

        let rotated = storage_with(backend, "new");
        assert_eq!(rotated.written_with_current_key("k").await.unwrap(), Some(false));
        let err = rotated.load::<String>("k").await.unwrap_err();
        assert!(matches!(err, StorageError::Decryption { .. }));
    }

    #[tokio::test]
    async fn test_garbage_record_is_a_hard_failure() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("k", "not an envelope").await.unwrap();
        let storage = storage_with(backend, "s");
        assert!(matches!(storage.load::<String>("k").await, Err(StorageError::Decryption { .. })));
    }

    #[tokio::test]
    async fn test_key_listing() {
        let storage = storage_with(Arc::new(MemoryStore::new()), "s");
        storage.store("groups.ops", &Vec::<String>::new()).await.unwrap();
        storage.store("groups.admins", &Vec::<String>::new()).await.unwrap();
        storage.store("other", &1).await.unwrap();

        assert_eq!(
            storage.keys_with_prefix("groups.").await.unwrap(),
            vec!["groups.admins".to_string(), "groups.ops".to_string()]
        );

        let mut seen = 0;
        storage.each_key(|_| seen += 1).await.unwrap();
        assert_eq!(seen, 3);

        storage.delete("other").await.unwrap();
        assert!(!storage.key_exists("other").await.unwrap());
        storage.clear().await.unwrap();
        assert!(!storage.key_exists("groups.ops").await.unwrap());
    }
}
