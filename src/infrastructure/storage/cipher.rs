//! Envelope encryption for stored values

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::application::errors::StorageError;

pub const CIPHER_ID: &str = "chacha20poly1305";

/// Used when no encryption secret is configured. Anyone who knows this value
/// can read the store.
pub const DEFAULT_SECRET: &str = "skillgate-insecure-default-secret";

/// 96-bit ChaCha20-Poly1305 nonce, stored in front of the ciphertext
const NONCE_SIZE: usize = 12;

/// Bytes of the key hash kept as the fingerprint
const FINGERPRINT_SIZE: usize = 8;

/// What actually lands in the backend for each key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub cipher_id: String,
    /// base64(nonce || ciphertext)
    pub data: String,
    /// Fingerprint of the key that sealed this envelope
    pub key: String,
}

pub struct EnvelopeCipher {
    cipher: ChaCha20Poly1305,
    fingerprint: String,
    is_default: bool,
}

impl EnvelopeCipher {
    /// Derive the cipher key by hashing `secret`, falling back to
    /// [`DEFAULT_SECRET`] when it is missing or empty.
    pub fn from_secret(secret: Option<&str>) -> Self {
        let (secret, is_default) = match secret {
            Some(s) if !s.is_empty() => (s, false),
            _ => {
                tracing::warn!("No encryption key configured, falling back to the built-in default secret");
                (DEFAULT_SECRET, true)
            }
        };

        let key_bytes = Sha256::digest(secret.as_bytes());
        let fingerprint = hex::encode(&Sha256::digest(key_bytes)[..FINGERPRINT_SIZE]);

        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key_bytes)),
            fingerprint,
            is_default,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Envelope, StorageError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self.cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;

        let mut data = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&ciphertext);

        Ok(Envelope {
            cipher_id: CIPHER_ID.to_string(),
            data: STANDARD.encode(data),
            key: self.fingerprint.clone(),
        })
    }

    /// Decrypt an envelope read from `key`. Any failure is an error: a value
    /// that does not decrypt cannot be trusted.
    pub fn open(&self, key: &str, envelope: &Envelope) -> Result<Vec<u8>, StorageError> {
        let fail = |reason: String| StorageError::Decryption {
            key: key.to_string(),
            reason,
        };

        if envelope.cipher_id != CIPHER_ID {
            return Err(fail(format!("unsupported cipher '{}'", envelope.cipher_id)));
        }

        let raw = STANDARD
            .decode(envelope.data.as_bytes())
            .map_err(|e| fail(format!("invalid encoding: {}", e)))?;
        if raw.len() < NONCE_SIZE {
            return Err(fail("ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                if envelope.key != self.fingerprint {
                    fail(format!(
                        "written with key {} but current key is {}",
                        envelope.key, self.fingerprint
                    ))
                } else {
                    fail("ciphertext failed authentication".to_string())
                }
            })
    }
}
