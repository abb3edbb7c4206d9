//! Path management for the credential vault
//!
//! Provides XDG-compliant path resolution for configuration, secrets, and
//! data files, plus validation of any path that originates in configuration.
//!
//! ## Path Resolution Order
//!
//! 1. `FISCUS_VAULT_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/fiscus-vault` or `~/.config/fiscus-vault`
//! 3. Windows: `%APPDATA%\fiscus-vault`

use std::path::{Component, Path, PathBuf};

use crate::error::VaultError;

/// Manages all paths used by the vault
#[derive(Debug, Clone)]
pub struct VaultPaths {
    /// Base directory for all vault data
    base_dir: PathBuf,
}

impl VaultPaths {
    /// Create a new VaultPaths instance
    ///
    /// Path resolution:
    /// 1. `FISCUS_VAULT_DATA_DIR` env var (explicit override)
    /// 2. Unix: `$XDG_CONFIG_HOME/fiscus-vault` or `~/.config/fiscus-vault`
    /// 3. Windows: `%APPDATA%\fiscus-vault`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, VaultError> {
        let base_dir = if let Ok(custom) = std::env::var("FISCUS_VAULT_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/fiscus-vault/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/fiscus-vault/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the secrets store (signing and encryption keys)
    pub fn secrets_file(&self) -> PathBuf {
        self.base_dir.join("secrets.env")
    }

    /// Get the path to users.json
    pub fn users_file(&self) -> PathBuf {
        self.data_dir().join("users.json")
    }

    /// Get the path to tokens.json
    pub fn tokens_file(&self) -> PathBuf {
        self.data_dir().join("tokens.json")
    }

    /// Resolve a configured relative path against the base directory.
    ///
    /// Configuration is not trusted: the value must be relative, must not
    /// contain null bytes, and must not traverse out of the base directory.
    /// This check is part of the vault's trust boundary and runs before any
    /// read or write against the resolved path.
    pub fn resolve_configured(&self, configured: &str) -> Result<PathBuf, VaultError> {
        if configured.is_empty() {
            return Err(VaultError::Config("Configured path is empty".into()));
        }
        if configured.contains('\0') {
            return Err(VaultError::Config(
                "Configured path contains a null byte".into(),
            ));
        }

        let relative = Path::new(configured);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(VaultError::Config(format!(
                        "Configured path escapes the data directory: {}",
                        configured
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(VaultError::Config(format!(
                        "Configured path must be relative: {}",
                        configured
                    )));
                }
            }
        }

        Ok(self.base_dir.join(relative))
    }

    /// Ensure all required directories exist
    ///
    /// Creates:
    /// - Base directory (~/.config/fiscus-vault/)
    /// - Data directory (~/.config/fiscus-vault/data/)
    pub fn ensure_directories(&self) -> Result<(), VaultError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if the vault has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    // Unix (Linux/macOS): Use XDG_CONFIG_HOME if set, otherwise ~/.config
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .map_err(|_| VaultError::Config("Could not determine home directory".into()))
        })?;
    Ok(config_base.join("fiscus-vault"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    // Windows: Use APPDATA
    let appdata = std::env::var("APPDATA")
        .map_err(|_| VaultError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("fiscus-vault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.secrets_file(), temp_dir.path().join("secrets.env"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.users_file(),
            temp_dir.path().join("data").join("users.json")
        );
        assert_eq!(
            paths.tokens_file(),
            temp_dir.path().join("data").join("tokens.json")
        );
    }

    #[test]
    fn test_resolve_configured_accepts_relative() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let resolved = paths.resolve_configured("data/custom-tokens.json").unwrap();
        assert_eq!(
            resolved,
            temp_dir.path().join("data").join("custom-tokens.json")
        );
    }

    #[test]
    fn test_resolve_configured_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let err = paths.resolve_configured("../outside.json").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));

        let err = paths.resolve_configured("data/../../outside.json").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_resolve_configured_rejects_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let err = paths.resolve_configured("/etc/passwd").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_resolve_configured_rejects_null_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let err = paths.resolve_configured("data/evil\0.json").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_resolve_configured_rejects_empty() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert!(paths.resolve_configured("").is_err());
    }
}
