//! fiscus-vault - Credential and token lifecycle core for the Fiscus
//! personal finance tracker
//!
//! This library owns the only part of the tracker with real secrecy
//! invariants: provisioning of cryptographic keys, encryption of third-party
//! access tokens at rest, user accounts with salted password hashing, and
//! stateless session authentication. The HTTP layer, the provider client,
//! and the browser UI are collaborators; their whole contract with this core
//! is "give me a bearer identity" and "give me a token to use."
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution, settings, and the secrets store
//! - `error`: Custom error types
//! - `models`: Core data models (users, items, session identities)
//! - `crypto`: Key provisioning and token encryption
//! - `storage`: JSON file storage layer (user and token stores)
//! - `auth`: Password hashing and session credentials
//!
//! # Example
//!
//! ```rust,ignore
//! use fiscus_vault::{config::VaultPaths, Vault};
//!
//! let vault = Vault::open(VaultPaths::new()?)?;
//! let user = vault.register("me@example.com", "longenough1")?;
//! let (_, bearer) = vault.login("me@example.com", "longenough1")?.unwrap();
//! ```

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod storage;
pub mod vault;

pub use error::{VaultError, VaultResult};
pub use vault::Vault;
