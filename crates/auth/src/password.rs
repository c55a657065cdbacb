//! Credential verification using Argon2id.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::AuthError;

/// Hash a plaintext secret into an Argon2id PHC string.
///
/// A fresh random salt is generated per call and embedded in the output, so
/// hashing the same secret twice yields different digests.
pub fn hash_password(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("password hashing failed: {e}")))
}

/// Verify a plaintext secret against a stored PHC hash.
///
/// A malformed digest is a failed verification, not an error. The
/// comparison itself is constant-time inside the Argon2 verifier.
pub fn verify_password(secret: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("admin123").unwrap();
        assert!(verify_password("admin123", &hash));
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("admin123").unwrap();
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn salt_differs_per_call() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn digest_never_contains_the_secret() {
        let hash = hash_password("plain-secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("plain-secret"));
    }

    #[test]
    fn malformed_digest_is_a_mismatch() {
        assert!(!verify_password("pw", "not-a-hash"));
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "$argon2id$v=19$broken"));
    }
}
