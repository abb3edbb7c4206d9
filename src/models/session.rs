//! Request-scoped session identity
//!
//! Produced by verifying a bearer credential; never persisted. The server
//! holds no session table.

use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// The identity embedded in a verified bearer credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub email: String,
    /// Unix timestamp the credential was issued at
    pub issued_at: u64,
    /// Unix timestamp the credential expires at
    pub expires_at: u64,
}
