//! User settings for the credential vault
//!
//! Manages deployment preferences: the authentication policy selected at
//! startup, the production flag that refuses the development bypass, session
//! lifetime, and optional overrides for the store file locations.

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;

/// Authentication policy selected at startup.
///
/// The development bypass is an explicit construction-time variant, never a
/// runtime environment check inside the hot authentication path, so a
/// production configuration cannot enable it by omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Verify every bearer credential against the signing key (default)
    #[default]
    Enforced,
    /// Skip verification and attach a fixed placeholder identity; refused
    /// when the deployment is flagged as production
    Bypass,
}

/// Session token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Lifetime of issued bearer tokens, in seconds
    pub ttl_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl_secs: 86_400 }
    }
}

/// User settings for the vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Authentication policy
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Whether this deployment is production; refuses the auth bypass
    #[serde(default)]
    pub production: bool,

    /// Session token settings
    #[serde(default)]
    pub session: SessionSettings,

    /// Optional override for the user table location, relative to the base
    /// directory; validated before use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_file: Option<String>,

    /// Optional override for the token table location, relative to the base
    /// directory; validated before use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_file: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            auth_mode: AuthMode::default(),
            production: false,
            session: SessionSettings::default(),
            users_file: None,
            tokens_file: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| VaultError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| VaultError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| VaultError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
