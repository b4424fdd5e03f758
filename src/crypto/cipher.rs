//! AES-256-GCM-SIV encryption of single field values.
//!
//! A field value is any JSON value; it is serialized losslessly before
//! encryption so decryption reconstructs the exact original structure. Each
//! call draws a fresh random 96-bit nonce from the OS CSPRNG, so encrypting
//! the same plaintext twice may produce different ciphertext. The string
//! representation is `v1.<base64url(nonce)>.<base64url(ciphertext+tag)>`,
//! safe to store in a single text column.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Byte length of an AES-256 key.
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce.
const NONCE_LEN: usize = 12;

/// Prefix at the start of every encrypted field value.
const VERSION_PREFIX: &str = "v1";

/// Errors produced by the cipher layer. Never fatal: callers surface them as
/// failed requests.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The stored value does not match the expected `v1.<nonce>.<ciphertext>` shape.
    #[error("ciphertext has invalid format")]
    InvalidFormat,
    /// Authentication failed: wrong key or tampered data.
    #[error("ciphertext unreadable with current key")]
    Unreadable,
    /// The plaintext could not be serialized, or the decrypted bytes are not valid JSON.
    #[error("field value serialization failed")]
    Serialization,
}

/// Symmetric cipher for single field values, keyed once for the process
/// lifetime. Constructed explicitly and passed to the codec so tests can
/// inject their own keys.
pub struct FieldCipher {
    cipher: Aes256GcmSiv,
}

impl FieldCipher {
    /// Build from raw key bytes.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        FieldCipher {
            cipher: Aes256GcmSiv::new(&(*key).into()),
        }
    }

    /// Derive the key from an arbitrary-length passphrase via SHA-256.
    /// Environment-sourced keys are passphrases, not raw key material.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self::new(&key)
    }

    /// Encrypt one field value. Serializes to JSON, encrypts with a fresh
    /// random nonce, and encodes as `v1.<nonce>.<ciphertext>`.
    pub fn encrypt(&self, plaintext: &Value) -> Result<String, CipherError> {
        let bytes = serde_json::to_vec(plaintext).map_err(|_| CipherError::Serialization)?;

        use aes_gcm_siv::aead::rand_core::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, bytes.as_ref())
            .map_err(|_| CipherError::Unreadable)?;

        Ok(format!(
            "{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(&ciphertext),
        ))
    }

    /// Decrypt a stored field value back to the original JSON value.
    pub fn decrypt(&self, stored: &str) -> Result<Value, CipherError> {
        let parts: Vec<&str> = stored.splitn(3, '.').collect();
        if parts.len() != 3 || parts[0] != VERSION_PREFIX {
            return Err(CipherError::InvalidFormat);
        }
        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| CipherError::InvalidFormat)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CipherError::InvalidFormat);
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| CipherError::InvalidFormat)?;

        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CipherError::Unreadable)?;
        serde_json::from_slice(&plaintext).map_err(|_| CipherError::Serialization)
    }
}
