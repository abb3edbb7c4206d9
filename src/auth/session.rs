//! Stateless session authentication
//!
//! Bearer credentials are HS256 JWTs signed with the provisioned signing
//! key. Verification is a two-state machine per request: unauthenticated
//! until the credential checks out, then authenticated for the request's
//! lifetime. Missing credentials and invalid credentials fail closed with
//! distinct errors; the HTTP layer collapses both to a generic 401.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{VaultError, VaultResult};
use crate::models::{SessionIdentity, UserId, UserProfile};

/// Minimum signing key length in bytes; shorter secrets weaken HS256
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Token lifetime used when issuing under the development bypass
const BYPASS_TTL_SECS: u64 = 3600;

/// Authentication policy, fixed at construction time.
///
/// The bypass exists for local development only and is refused outright for
/// production deployments; it can never be toggled by the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Verify signature and expiry on every request
    Enforced {
        /// Lifetime of issued tokens, in seconds
        ttl_secs: u64,
    },
    /// Skip verification and attach a fixed placeholder identity
    DevelopmentBypass,
}

/// Claim set embedded in issued bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// User ID (UUID string)
    sub: String,
    email: String,
    /// Issued at (Unix timestamp)
    iat: u64,
    /// Expiration time (Unix timestamp)
    exp: u64,
}

/// Issues and verifies session credentials against the signing key
pub struct SessionAuthenticator {
    policy: AuthPolicy,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionAuthenticator {
    /// Create an authenticator from the provisioned signing key.
    ///
    /// Fails with a configuration error if the key is too short or if the
    /// development bypass is requested for a production deployment.
    pub fn new(signing_key: &str, policy: AuthPolicy, production: bool) -> VaultResult<Self> {
        if production && policy == AuthPolicy::DevelopmentBypass {
            return Err(VaultError::Config(
                "Authentication bypass is not permitted in production".into(),
            ));
        }

        if signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(VaultError::Config(format!(
                "Signing key must be at least {} bytes",
                MIN_SIGNING_KEY_LEN
            )));
        }

        Ok(Self {
            policy,
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
        })
    }

    /// The policy this authenticator was constructed with
    pub fn policy(&self) -> AuthPolicy {
        self.policy
    }

    /// Issue a bearer token for a user who just authenticated
    pub fn issue_token(&self, user: &UserProfile) -> VaultResult<String> {
        let now = unix_now()?;
        let ttl = match self.policy {
            AuthPolicy::Enforced { ttl_secs } => ttl_secs,
            AuthPolicy::DevelopmentBypass => BYPASS_TTL_SECS,
        };

        let claims = Claims {
            sub: user.id.as_uuid().to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + ttl,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| VaultError::Crypto(format!("Failed to sign session token: {}", e)))
    }

    /// Verify the `Authorization` header of a request and produce the
    /// request-scoped identity.
    ///
    /// Fail-closed: a missing or non-bearer header is `MissingCredential`; a
    /// bad signature, expired token, or malformed claim set is
    /// `InvalidCredential`. No retry, no partial trust.
    pub fn authenticate(&self, authorization: Option<&str>) -> VaultResult<SessionIdentity> {
        if self.policy == AuthPolicy::DevelopmentBypass {
            return Ok(placeholder_identity());
        }

        let token = extract_bearer(authorization).ok_or(VaultError::MissingCredential)?;

        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                debug!(reason = %e, "Rejected bearer credential");
                VaultError::InvalidCredential
            })?;

        let user_id = UserId::parse(&data.claims.sub).map_err(|_| VaultError::InvalidCredential)?;

        Ok(SessionIdentity {
            user_id,
            email: data.claims.email,
            issued_at: data.claims.iat,
            expires_at: data.claims.exp,
        })
    }
}

/// Extract the token from a `Bearer <token>` authorization header
fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let token = authorization?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Fixed identity attached under the development bypass
fn placeholder_identity() -> SessionIdentity {
    SessionIdentity {
        user_id: UserId::from_uuid(uuid::Uuid::nil()),
        email: "dev@localhost".into(),
        issued_at: 0,
        expires_at: u64::MAX,
    }
}

fn unix_now() -> VaultResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| VaultError::Config(format!("System clock is before the Unix epoch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "test-signing-key-that-is-plenty-long-for-hs256";

    fn test_authenticator() -> SessionAuthenticator {
        SessionAuthenticator::new(TEST_KEY, AuthPolicy::Enforced { ttl_secs: 3600 }, false)
            .unwrap()
    }

    fn test_user() -> UserProfile {
        UserProfile {
            id: UserId::new(),
            email: "a@b.com".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_authenticate() {
        let auth = test_authenticator();
        let user = test_user();

        let token = auth.issue_token(&user).unwrap();
        let identity = auth
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap();

        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, "a@b.com");
        assert!(identity.expires_at > identity.issued_at);
    }

    #[test]
    fn test_missing_credential() {
        let auth = test_authenticator();

        assert!(matches!(
            auth.authenticate(None),
            Err(VaultError::MissingCredential)
        ));
        assert!(matches!(
            auth.authenticate(Some("")),
            Err(VaultError::MissingCredential)
        ));
        assert!(matches!(
            auth.authenticate(Some("Basic dXNlcjpwYXNz")),
            Err(VaultError::MissingCredential)
        ));
        assert!(matches!(
            auth.authenticate(Some("Bearer ")),
            Err(VaultError::MissingCredential)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let auth = test_authenticator();

        assert!(matches!(
            auth.authenticate(Some("Bearer not-a-jwt")),
            Err(VaultError::InvalidCredential)
        ));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let auth = test_authenticator();
        let other = SessionAuthenticator::new(
            "a-completely-different-signing-key-also-long",
            AuthPolicy::Enforced { ttl_secs: 3600 },
            false,
        )
        .unwrap();

        let token = other.issue_token(&test_user()).unwrap();
        assert!(matches!(
            auth.authenticate(Some(&format!("Bearer {}", token))),
            Err(VaultError::InvalidCredential)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = test_authenticator();
        let user = test_user();

        // Sign an already-expired claim set with the same key, well past the
        // default validation leeway
        let now = unix_now().unwrap();
        let claims = Claims {
            sub: user.id.as_uuid().to_string(),
            email: user.email.clone(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_KEY.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            auth.authenticate(Some(&format!("Bearer {}", token))),
            Err(VaultError::InvalidCredential)
        ));
    }

    #[test]
    fn test_bypass_yields_placeholder_identity() {
        let auth =
            SessionAuthenticator::new(TEST_KEY, AuthPolicy::DevelopmentBypass, false).unwrap();

        let identity = auth.authenticate(None).unwrap();
        assert!(identity.user_id.as_uuid().is_nil());
        assert_eq!(identity.email, "dev@localhost");
    }

    #[test]
    fn test_bypass_refused_in_production() {
        let result = SessionAuthenticator::new(TEST_KEY, AuthPolicy::DevelopmentBypass, true);
        assert!(matches!(result, Err(VaultError::Config(_))));
    }

    #[test]
    fn test_short_signing_key_rejected() {
        let result =
            SessionAuthenticator::new("short", AuthPolicy::Enforced { ttl_secs: 3600 }, false);
        assert!(matches!(result, Err(VaultError::Config(_))));
    }
}
