//! Storage layer for the credential vault
//!
//! Provides JSON file storage with atomic writes, owner-only permissions,
//! and per-store serialization of mutations.

pub mod file_io;
pub mod tokens;
pub mod users;

pub use file_io::{read_json, write_json_atomic};
pub use tokens::TokenStore;
pub use users::UserStore;

use std::path::PathBuf;

use crate::config::{Settings, VaultPaths};
use crate::crypto::Cipher;
use crate::error::VaultError;

/// Main storage coordinator that provides access to both stores
///
/// Constructed only after key provisioning has produced valid material,
/// because the token store's encryption correctness depends on a stable key.
pub struct Storage {
    paths: VaultPaths,
    pub users: UserStore,
    pub tokens: TokenStore,
}

impl Storage {
    /// Create a new Storage instance and load both stores from disk.
    ///
    /// Store locations come from the defaults unless settings override them;
    /// overrides pass through the path trust boundary before any I/O.
    pub fn new(paths: VaultPaths, settings: &Settings, cipher: Cipher) -> Result<Self, VaultError> {
        paths.ensure_directories()?;

        let users_path = resolve_override(&paths, settings.users_file.as_deref(), paths.users_file())?;
        let tokens_path =
            resolve_override(&paths, settings.tokens_file.as_deref(), paths.tokens_file())?;

        let storage = Self {
            users: UserStore::new(users_path),
            tokens: TokenStore::new(tokens_path, cipher),
            paths,
        };

        storage.users.load()?;
        storage.tokens.load()?;

        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }
}

fn resolve_override(
    paths: &VaultPaths,
    configured: Option<&str>,
    default: PathBuf,
) -> Result<PathBuf, VaultError> {
    match configured {
        Some(value) => paths.resolve_configured(value),
        None => Ok(default),
    }
}
