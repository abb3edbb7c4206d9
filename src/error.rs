//! Custom error types for the credential vault
//!
//! This module defines the error hierarchy for the subsystem using thiserror
//! for ergonomic error definitions.
//!
//! Error messages carry context (file paths, entity identifiers), never
//! payloads: raw passwords, decrypted tokens, and key material must not be
//! formatted into any variant.

use thiserror::Error;

/// The main error type for vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration-related errors (missing or malformed key material,
    /// invalid deployment flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for registration input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate entity errors (e.g. an already-registered email)
    #[error("{entity_type} already exists: {identifier}")]
    Conflict {
        entity_type: &'static str,
        identifier: String,
    },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Malformed or undecryptable blob; treated as a data-integrity failure
    /// and always surfaced, never silently defaulted
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No bearer credential was presented on an authenticated request
    #[error("Missing credential")]
    MissingCredential,

    /// A bearer credential was presented but failed verification
    /// (bad signature, expired, malformed claims)
    #[error("Invalid credential")]
    InvalidCredential,

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl VaultError {
    /// Create a "conflict" error for users
    pub fn user_exists(identifier: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this is a crypto (data integrity) error
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }

    /// Check if this is an authentication rejection (missing or invalid
    /// credential); both map to a generic 401-equivalent at the HTTP layer
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential)
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for vault operations
pub type VaultResult<T> = Result<T, VaultError>;
