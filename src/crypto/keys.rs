//! One-time key provisioning
//!
//! Guarantees a session signing key and a token encryption key exist before
//! any other component is constructed. Keys are generated from the OS CSPRNG
//! on first run, persisted to the secrets store with owner-only permissions,
//! and read back on every subsequent start. Valid material is never
//! regenerated: doing so would make every stored token and every outstanding
//! session unrecoverable.

use std::fmt;
use std::path::Path;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use tracing::{debug, warn};

use crate::config::SecretsFile;

/// Secrets-file entry holding the session signing key
pub const SIGNING_KEY_ENTRY: &str = "SESSION_SIGNING_KEY";

/// Secrets-file entry holding the token encryption key
pub const ENCRYPTION_KEY_ENTRY: &str = "TOKEN_ENCRYPTION_KEY";

/// Values that count as "not provisioned". These ship in sample
/// configuration and must never be used as real key material.
const PLACEHOLDER_VALUES: &[&str] = &[
    "changeme",
    "change-me",
    "replace-me",
    "your-signing-key-here",
    "your-encryption-key-here",
];

/// Signing key entropy in bytes (hex-encoded to 128 characters)
const SIGNING_KEY_BYTES: usize = 64;

/// Encryption key length in bytes; AES-256 requires exactly 32
const ENCRYPTION_KEY_BYTES: usize = 32;

/// The two process-wide secrets, resolved once at startup.
///
/// Constructed only by [`ensure_keys`] and passed by reference to every
/// component that needs it; nothing reads key material from ambient state.
#[derive(Clone)]
pub struct SecretMaterial {
    signing_key: String,
    encryption_key: String,
    ephemeral: bool,
}

impl SecretMaterial {
    /// The session signing key (hex string)
    pub fn signing_key(&self) -> &str {
        &self.signing_key
    }

    /// The token encryption key (64 hex characters)
    pub fn encryption_key(&self) -> &str {
        &self.encryption_key
    }

    /// True when the secrets store was unreachable and this run is using
    /// in-memory keys. Anything encrypted under ephemeral keys becomes
    /// unrecoverable after restart.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Construct material directly from known keys (useful for testing)
    pub fn from_keys(signing_key: impl Into<String>, encryption_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            encryption_key: encryption_key.into(),
            ephemeral: false,
        }
    }
}

// Key material must not leak through Debug output
impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}

/// Ensure both keys exist in the secrets store, generating and persisting
/// replacements for any that are absent, empty, or placeholders.
///
/// Idempotent: when both keys already validate the store is left
/// byte-identical. A store that cannot be read or written degrades to
/// ephemeral in-memory keys with a warning rather than failing the run; this
/// availability-over-durability tradeoff fits a single-user local deployment
/// and must be replaced with a hard failure for multi-instance targets.
pub fn ensure_keys(secrets_path: &Path) -> SecretMaterial {
    let mut secrets = match SecretsFile::load(secrets_path) {
        Ok(secrets) => secrets,
        Err(e) => {
            warn!(error = %e, "Secrets store unreadable; using ephemeral keys for this run");
            return SecretMaterial {
                signing_key: generate_key(SIGNING_KEY_BYTES),
                encryption_key: generate_key(ENCRYPTION_KEY_BYTES),
                ephemeral: true,
            };
        }
    };

    let mut provisioned = false;

    let signing_key = match valid_entry(&secrets, SIGNING_KEY_ENTRY) {
        Some(value) => value,
        None => {
            let value = generate_key(SIGNING_KEY_BYTES);
            secrets.set(SIGNING_KEY_ENTRY, &value);
            provisioned = true;
            value
        }
    };

    let encryption_key = match valid_entry(&secrets, ENCRYPTION_KEY_ENTRY) {
        Some(value) => value,
        None => {
            let value = generate_key(ENCRYPTION_KEY_BYTES);
            secrets.set(ENCRYPTION_KEY_ENTRY, &value);
            provisioned = true;
            value
        }
    };

    if !provisioned {
        debug!("Key material already provisioned");
        return SecretMaterial {
            signing_key,
            encryption_key,
            ephemeral: false,
        };
    }

    match secrets.save(secrets_path) {
        Ok(()) => {
            debug!("Generated and persisted new key material");
            SecretMaterial {
                signing_key,
                encryption_key,
                ephemeral: false,
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to persist key material; using ephemeral keys for this run");
            SecretMaterial {
                signing_key,
                encryption_key,
                ephemeral: true,
            }
        }
    }
}

/// Read an entry and validate it is usable key material
fn valid_entry(secrets: &SecretsFile, key: &str) -> Option<String> {
    let value = secrets.get(key)?.trim();
    if value.is_empty() {
        return None;
    }
    if PLACEHOLDER_VALUES
        .iter()
        .any(|p| value.eq_ignore_ascii_case(p))
    {
        return None;
    }
    Some(value.to_string())
}

/// Generate `len` bytes from the OS CSPRNG, hex-encoded
fn generate_key(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
