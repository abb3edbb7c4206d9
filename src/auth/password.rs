//! Password hashing and registration validation
//!
//! Passwords are hashed with Argon2id, a memory-hard function whose default
//! parameters land in the ~100ms class on commodity hardware. Verification is
//! constant-time inside the argon2 crate; lookups for unknown emails still
//! pay the cost of one verification against a dummy hash so timing does not
//! reveal account existence.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{VaultError, VaultResult};

/// Password policy bounds
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Upper bound on email length per RFC 5321
const MAX_EMAIL_LEN: usize = 254;

/// Validate email shape before touching storage
///
/// Intentionally loose: one `@` with non-empty local part and a dotted,
/// non-empty domain. Real deliverability is the mail system's problem.
pub fn validate_email(email: &str) -> VaultResult<()> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(VaultError::Validation("Invalid email address".into()));
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(VaultError::Validation("Invalid email address".into()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(VaultError::Validation("Invalid email address".into()));
    };

    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(VaultError::Validation("Invalid email address".into()));
    }

    Ok(())
}

/// Validate password strength: 8 to 128 characters, at least one letter and
/// one digit
pub fn validate_password(raw_password: &str) -> VaultResult<()> {
    let len = raw_password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(VaultError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(VaultError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    if !raw_password.chars().any(|c| c.is_alphabetic()) {
        return Err(VaultError::Validation(
            "Password must contain at least one letter".into(),
        ));
    }
    if !raw_password.chars().any(|c| c.is_ascii_digit()) {
        return Err(VaultError::Validation(
            "Password must contain at least one digit".into(),
        ));
    }
    Ok(())
}

/// Hash a raw password with Argon2id and a fresh random salt
///
/// The raw bytes are not retained; callers should drop their copy as soon as
/// this returns.
pub fn hash_password(raw_password: &str) -> VaultResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|e| VaultError::Crypto(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a raw password against a stored PHC string
///
/// Returns `Ok(false)` on mismatch; errors only when the stored hash itself
/// is malformed, which indicates data corruption.
pub fn verify_password(raw_password: &str, stored_hash: &str) -> VaultResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| VaultError::Crypto(format!("Malformed stored password hash: {}", e)))?;

    match Argon2::default().verify_password(raw_password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(VaultError::Crypto(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Burn one verification's worth of work against a fixed dummy hash.
///
/// Called on the unknown-email path so its duration matches the
/// known-email/wrong-password path.
pub(crate) fn equalize_timing(raw_password: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let dummy = DUMMY_HASH
        .get_or_init(|| hash_password("timing-equalizer-0").unwrap_or_default());
    if !dummy.is_empty() {
        let _ = verify_password(raw_password, dummy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last@sub.domain.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("nodomain").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email(&format!("{}@b.com", "a".repeat(300))).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password("Abcdefg1").is_ok());

        // Too short
        assert!(validate_password("short").is_err());
        assert!(validate_password("ab1").is_err());
        // No digit
        assert!(validate_password("lettersonly").is_err());
        // No letter
        assert!(validate_password("12345678").is_err());
        // Too long
        assert!(validate_password(&format!("a1{}", "x".repeat(130))).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("longenough1").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("longenough1", &hash).unwrap());
        assert!(!verify_password("wrongpass1", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hash1 = hash_password("longenough1").unwrap();
        let hash2 = hash_password("longenough1").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_malformed_stored_hash_is_crypto_error() {
        let result = verify_password("longenough1", "not-a-phc-string");
        assert!(matches!(result, Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_equalize_timing_does_not_panic() {
        equalize_timing("whatever1");
        equalize_timing("");
    }
}
