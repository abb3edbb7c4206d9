//! AES-256-GCM encryption/decryption of access tokens
//!
//! Each encryption operation generates a unique nonce so identical tokens
//! never produce identical ciphertexts. The GCM tag rides inside the
//! ciphertext portion, so any tampering fails authentication on decrypt.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{VaultError, VaultResult};

use super::secure_memory::SecureString;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Delimiter between the IV and ciphertext portions of a blob. A colon can
/// never appear in hex output, so splitting is unambiguous.
const BLOB_DELIMITER: char = ':';

/// An encrypted token at rest: hex-encoded IV and ciphertext joined by `:`
///
/// This is the exact on-disk representation (`"ivHex:cipherHex"`); the blob
/// serializes as that single string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    iv: String,
    ciphertext: String,
}

impl EncryptedBlob {
    fn new(iv: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            iv: hex::encode(iv),
            ciphertext: hex::encode(ciphertext),
        }
    }

    /// Decode the IV from hex
    fn decode_iv(&self) -> VaultResult<Vec<u8>> {
        hex::decode(&self.iv).map_err(|e| VaultError::Crypto(format!("Invalid IV encoding: {}", e)))
    }

    /// Decode the ciphertext from hex
    fn decode_ciphertext(&self) -> VaultResult<Vec<u8>> {
        hex::decode(&self.ciphertext)
            .map_err(|e| VaultError::Crypto(format!("Invalid ciphertext encoding: {}", e)))
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.iv, BLOB_DELIMITER, self.ciphertext)
    }
}

impl FromStr for EncryptedBlob {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (iv, ciphertext) = s
            .split_once(BLOB_DELIMITER)
            .ok_or_else(|| VaultError::Crypto("Blob is missing the IV delimiter".into()))?;

        if iv.is_empty() || ciphertext.is_empty() {
            return Err(VaultError::Crypto("Blob has an empty segment".into()));
        }

        let blob = Self {
            iv: iv.to_string(),
            ciphertext: ciphertext.to_string(),
        };

        // Reject non-hex segments up front rather than at decrypt time
        blob.decode_iv()?;
        blob.decode_ciphertext()?;

        Ok(blob)
    }
}

impl Serialize for EncryptedBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Symmetric cipher over the process-wide encryption key
///
/// CPU-only; safe to share across threads.
#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
}

impl Cipher {
    /// Construct a cipher from the configured key material.
    ///
    /// The key must be exactly 64 hexadecimal characters (32 bytes). Anything
    /// else is a configuration error: tolerating alternate formats would
    /// silently weaken the key, so malformed material is rejected outright.
    pub fn new(key_hex: &str) -> VaultResult<Self> {
        if key_hex.len() != 64 {
            return Err(VaultError::Config(format!(
                "Encryption key must be 64 hex characters, got {}",
                key_hex.len()
            )));
        }

        let bytes = hex::decode(key_hex)
            .map_err(|_| VaultError::Config("Encryption key is not valid hex".into()))?;

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Encrypt a plaintext token, generating a fresh random IV
    pub fn encrypt(&self, plaintext: &str) -> VaultResult<EncryptedBlob> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VaultError::Crypto(format!("Failed to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Crypto(format!("Encryption failed: {}", e)))?;

        Ok(EncryptedBlob::new(&nonce_bytes, &ciphertext))
    }

    /// Decrypt a blob back to the plaintext token
    ///
    /// Fails with a crypto error on a malformed blob, a wrong key, or any
    /// tampering; never returns garbage.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> VaultResult<SecureString> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VaultError::Crypto(format!("Failed to create cipher: {}", e)))?;

        let nonce_bytes = blob.decode_iv()?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(VaultError::Crypto(format!(
                "Invalid IV size: expected {}, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            )));
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = blob.decode_ciphertext()?;

        let plaintext = cipher.decrypt(nonce, ciphertext.as_ref()).map_err(|_| {
            VaultError::Crypto("Decryption failed: wrong key or corrupted data".into())
        })?;

        let plaintext = String::from_utf8(plaintext)
            .map_err(|e| VaultError::Crypto(format!("Invalid UTF-8 in decrypted data: {}", e)))?;

        Ok(SecureString::new(plaintext))
    }
}

// Key bytes must not leak through Debug output
impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}
