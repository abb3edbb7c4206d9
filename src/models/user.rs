//! User account records
//!
//! [`UserRecord`] is the stored form and carries the Argon2id password hash;
//! [`UserProfile`] is the shape handed back to callers, with the hash
//! stripped. Email comparison is case-sensitive throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// A stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque random identifier, immutable once assigned
    pub id: UserId,
    /// Unique across all records; compared case-sensitively
    pub email: String,
    /// Argon2id PHC string; never the raw password
    pub password_hash: String,
    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a record for a freshly registered user
    pub fn new(email: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// The caller-facing view of this record, without the hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// A user account as exposed to callers: no hash material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_strips_hash() {
        let record = UserRecord::new("a@b.com", "$argon2id$fake".into());
        let profile = record.profile();

        assert_eq!(profile.id, record.id);
        assert_eq!(profile.email, "a@b.com");

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn test_record_serde_round_trip() {
        let record = UserRecord::new("a@b.com", "$argon2id$fake".into());
        let json = serde_json::to_string(&record).unwrap();
        let back: UserRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, record.id);
        assert_eq!(back.email, record.email);
        assert_eq!(back.password_hash, record.password_hash);
    }
}
