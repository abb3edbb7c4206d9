//! Configuration module for the credential vault
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution with a validated trust boundary
//! - User settings persistence (auth policy, deployment flags)
//! - The env-style secrets store mutated by key provisioning

pub mod paths;
pub mod secrets;
pub mod settings;

pub use paths::VaultPaths;
pub use secrets::SecretsFile;
pub use settings::{AuthMode, Settings};
