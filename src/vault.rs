//! Top-level coordinator tying the startup sequence together
//!
//! The order is load-bearing: key provisioning runs to completion first,
//! because the stores' encryption correctness and session verification both
//! depend on stable key material. Everything downstream receives the
//! provisioned material by reference; nothing reads keys from ambient state.

use tracing::{info, warn};

use crate::auth::{AuthPolicy, SessionAuthenticator};
use crate::config::{AuthMode, Settings, VaultPaths};
use crate::crypto::{ensure_keys, Cipher, SecureString};
use crate::error::VaultResult;
use crate::models::{ItemId, SessionIdentity, UserId, UserProfile};
use crate::storage::Storage;

/// The assembled credential vault: stores, cipher, and session authority
pub struct Vault {
    settings: Settings,
    storage: Storage,
    sessions: SessionAuthenticator,
}

impl Vault {
    /// Open the vault rooted at the given paths.
    ///
    /// Provisions key material, constructs the cipher and session
    /// authenticator from it, then loads both stores.
    pub fn open(paths: VaultPaths) -> VaultResult<Self> {
        paths.ensure_directories()?;
        let settings = Settings::load_or_create(&paths)?;

        let material = ensure_keys(&paths.secrets_file());
        if material.is_ephemeral() {
            warn!("Running with ephemeral keys; stored tokens will be unrecoverable after restart");
        }

        let cipher = Cipher::new(material.encryption_key())?;

        let policy = match settings.auth_mode {
            AuthMode::Enforced => AuthPolicy::Enforced {
                ttl_secs: settings.session.ttl_secs,
            },
            AuthMode::Bypass => AuthPolicy::DevelopmentBypass,
        };
        let sessions = SessionAuthenticator::new(material.signing_key(), policy, settings.production)?;

        let storage = Storage::new(paths, &settings, cipher)?;

        info!(users = storage.users.count()?, tokens = storage.tokens.count()?, "Vault opened");

        Ok(Self {
            settings,
            storage,
            sessions,
        })
    }

    /// Register a new user account
    pub fn register(&self, email: &str, raw_password: &str) -> VaultResult<UserProfile> {
        self.storage.users.create_user(email, raw_password)
    }

    /// Authenticate a login attempt; on success returns the profile and a
    /// freshly issued bearer token
    pub fn login(&self, email: &str, raw_password: &str) -> VaultResult<Option<(UserProfile, String)>> {
        match self.storage.users.verify_password(email, raw_password)? {
            Some(profile) => {
                let token = self.sessions.issue_token(&profile)?;
                Ok(Some((profile, token)))
            }
            None => Ok(None),
        }
    }

    /// Verify a request's `Authorization` header
    pub fn authenticate(&self, authorization: Option<&str>) -> VaultResult<SessionIdentity> {
        self.sessions.authenticate(authorization)
    }

    /// Store the access token for a newly linked item
    pub fn link_item(&self, user_id: UserId, item_id: ItemId, access_token: &str) -> VaultResult<()> {
        self.storage.tokens.store_token(user_id, item_id, access_token)
    }

    /// Fetch the decrypted access token for an item, if linked
    pub fn item_token(&self, user_id: UserId, item_id: &ItemId) -> VaultResult<Option<SecureString>> {
        self.storage.tokens.get_token(user_id, item_id)
    }

    /// Remove the access token for an unlinked item
    pub fn unlink_item(&self, user_id: UserId, item_id: &ItemId) -> VaultResult<bool> {
        self.storage.tokens.delete_token(user_id, item_id)
    }

    /// The loaded settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The underlying stores
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The session authenticator
    pub fn sessions(&self) -> &SessionAuthenticator {
        &self.sessions
    }
}
