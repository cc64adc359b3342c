//! Symmetric cipher collaborator.
//!
//! [`AesGcmCipher`] uses AES-256-GCM with:
//! - 256-bit key ([`EncryptionKey`], validated on construction, zeroized on drop)
//! - 96-bit random nonce per encryption
//! - 128-bit authentication tag
//!
//! The opaque string stored remotely is `base64(nonce(12) || ciphertext || tag(16))`.

use std::fmt;
use std::path::Path;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;
use zeroize::Zeroize;

use envsync_core::{KeySource, ProjectConfig};

use crate::error::{io_err, SyncError};

pub const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key size: must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("ciphertext too short ({0} bytes)")]
    Malformed(usize),

    /// Wrong key or tampered ciphertext.
    #[error("authentication failed: wrong key or corrupted ciphertext")]
    Authentication,

    #[error("encryption failed")]
    Encryption,

    #[error("no encryption key available: {0}")]
    MissingKey(String),
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A validated 256-bit key.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        Self { bytes: key.into() }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let bytes: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CipherError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Decode a base64 key; surrounding whitespace (e.g. a trailing newline
    /// in a key file) is ignored.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let mut decoded = STANDARD.decode(encoded.trim())?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Resolve the key: CLI override, then the configured source.
///
/// `env_value` is the content of `ENVSYNC_ENCRYPTION_KEY`, passed in by the
/// caller so this function never reads process state.
pub fn load_key(
    config: &ProjectConfig,
    cli_override: Option<&str>,
    env_value: Option<String>,
) -> Result<EncryptionKey, SyncError> {
    if let Some(encoded) = cli_override {
        return Ok(EncryptionKey::from_base64(encoded)?);
    }

    match config.key_source {
        KeySource::Env => {
            let Some(mut encoded) = env_value.filter(|v| !v.trim().is_empty()) else {
                return Err(CipherError::MissingKey(format!(
                    "key_source is 'env', but {} is not set",
                    envsync_core::config::KEY_ENV_VAR
                ))
                .into());
            };
            let key = EncryptionKey::from_base64(&encoded);
            encoded.zeroize();
            Ok(key?)
        }
        KeySource::File => {
            let path = config.key_file.as_deref().ok_or_else(|| {
                CipherError::MissingKey("key_source is 'file', but key_file is not set".to_string())
            })?;
            read_key_file(path)
        }
    }
}

fn read_key_file(path: &Path) -> Result<EncryptionKey, SyncError> {
    let mut encoded = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let key = EncryptionKey::from_base64(&encoded);
    encoded.zeroize();
    Ok(key?)
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

/// Encrypts plaintext into an opaque, storable string and back.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], key: &EncryptionKey) -> Result<String, CipherError>;

    /// Must return [`CipherError::Authentication`] for a wrong key or
    /// tampered input, never the raw bytes.
    fn decrypt(&self, opaque: &str, key: &EncryptionKey) -> Result<Vec<u8>, CipherError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8], key: &EncryptionKey) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // aes-gcm appends the tag, so this is ciphertext || tag.
        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&sealed);
        Ok(STANDARD.encode(blob))
    }

    fn decrypt(&self, opaque: &str, key: &EncryptionKey) -> Result<Vec<u8>, CipherError> {
        let blob = STANDARD.decode(opaque.trim())?;
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Malformed(blob.len()));
        }

        let (nonce, sealed) = blob.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)
    }
}

/// Decrypt `opaque` with `old` and re-encrypt it with `new`.
pub fn rotate_key(
    cipher: &dyn Cipher,
    old: &EncryptionKey,
    new: &EncryptionKey,
    opaque: &str,
) -> Result<String, CipherError> {
    let mut plaintext = cipher.decrypt(opaque, old)?;
    let rotated = cipher.encrypt(&plaintext, new);
    plaintext.zeroize();
    rotated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
