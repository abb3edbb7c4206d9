//! Cryptographic functions for the credential vault
//!
//! Provides AES-256-GCM encryption of access tokens at rest, one-time key
//! provisioning, and secure memory handling for secrets in transit.

pub mod cipher;
pub mod keys;
pub mod secure_memory;

pub use cipher::{Cipher, EncryptedBlob};
pub use keys::{ensure_keys, SecretMaterial};
pub use secure_memory::SecureString;
