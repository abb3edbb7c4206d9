//! User store: durable identity -> salted password hash mapping
//!
//! The whole user table lives in memory behind one lock and is rewritten to
//! users.json on every mutation, with the write guard held across mutate and
//! persist so concurrent registrations cannot overwrite each other's durable
//! write. Acceptable only because the table is small (single digits to low
//! hundreds of users); larger deployments need incremental persistence.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::password;
use crate::error::{VaultError, VaultResult};
use crate::models::{UserId, UserProfile, UserRecord};

use super::file_io::{read_json, write_json_atomic};

/// On-disk user entry; the record's ID is the map key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

type UserTable = HashMap<UserId, StoredUser>;

/// Durable user account store with an in-memory cache
///
/// Email comparison is case-sensitive: `A@b.com` and `a@b.com` are distinct
/// accounts.
pub struct UserStore {
    path: PathBuf,
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl UserStore {
    /// Create a new user store backed by the given file
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Load the user table from disk.
    ///
    /// An unreadable or corrupt file degrades to an empty store (cold start)
    /// with a warning; refusing to start would lock the user out entirely.
    pub fn load(&self) -> VaultResult<()> {
        let table: UserTable = match read_json(&self.path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "User table unreadable; starting with an empty store");
                UserTable::default()
            }
        };

        let mut users = self.write_guard()?;
        users.clear();
        for (id, stored) in table {
            users.insert(
                id,
                UserRecord {
                    id,
                    email: stored.email,
                    password_hash: stored.password_hash,
                    created_at: stored.created_at,
                },
            );
        }

        Ok(())
    }

    /// Register a new user.
    ///
    /// Validates email shape and password strength before touching storage,
    /// hashes the password, and persists the full table synchronously before
    /// returning. Fails with a conflict error if the email is already
    /// registered.
    pub fn create_user(&self, email: &str, raw_password: &str) -> VaultResult<UserProfile> {
        password::validate_email(email)?;
        password::validate_password(raw_password)?;

        // Hash outside the lock; this is the slow part by design
        let password_hash = password::hash_password(raw_password)?;

        let mut users = self.write_guard()?;
        if users.values().any(|u| u.email == email) {
            return Err(VaultError::user_exists(email));
        }

        let record = UserRecord::new(email, password_hash);
        let profile = record.profile();
        users.insert(record.id, record);

        self.persist(&users)?;
        Ok(profile)
    }

    /// Check a login attempt.
    ///
    /// Returns the profile on a match, `None` on a wrong password or an
    /// unknown email; the two cases are indistinguishable to the caller and,
    /// via a dummy verification on the unknown-email path, in timing. Errors
    /// only on storage-level faults.
    pub fn verify_password(
        &self,
        email: &str,
        raw_password: &str,
    ) -> VaultResult<Option<UserProfile>> {
        let record = {
            let users = self.read_guard()?;
            users.values().find(|u| u.email == email).cloned()
        };

        // Verification runs outside the lock: it takes ~100ms on purpose
        match record {
            Some(record) => {
                if password::verify_password(raw_password, &record.password_hash)? {
                    Ok(Some(record.profile()))
                } else {
                    Ok(None)
                }
            }
            None => {
                password::equalize_timing(raw_password);
                Ok(None)
            }
        }
    }

    /// Look up a user by ID
    pub fn find_by_id(&self, id: UserId) -> VaultResult<Option<UserProfile>> {
        let users = self.read_guard()?;
        Ok(users.get(&id).map(|u| u.profile()))
    }

    /// Number of registered users
    pub fn count(&self) -> VaultResult<usize> {
        Ok(self.read_guard()?.len())
    }

    /// Serialize the table under the held write guard and flush to disk
    fn persist(&self, users: &HashMap<UserId, UserRecord>) -> VaultResult<()> {
        let table: UserTable = users
            .iter()
            .map(|(id, record)| {
                (
                    *id,
                    StoredUser {
                        email: record.email.clone(),
                        password_hash: record.password_hash.clone(),
                        created_at: record.created_at,
                    },
                )
            })
            .collect();

        write_json_atomic(&self.path, &table)
    }

    fn read_guard(&self) -> VaultResult<std::sync::RwLockReadGuard<'_, HashMap<UserId, UserRecord>>> {
        self.users
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_guard(
        &self,
    ) -> VaultResult<std::sync::RwLockWriteGuard<'_, HashMap<UserId, UserRecord>>> {
        self.users
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}
