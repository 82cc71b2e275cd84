//! Password hashing for stored accounts (argon2id, PHC string format).

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::{ServiceError, ServiceResult};

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {e}")))
}

/// Whether `password` matches the stored hash.
///
/// A stored value that is not a PHC string is an internal error, not a
/// mismatch.
pub fn verify_password(password: &str, stored: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ServiceError::Internal(format!("Stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn matching_and_mismatching_passwords() {
        let stored = hash_password("correct-horse").unwrap();
        assert!(verify_password("correct-horse", &stored).unwrap());
        assert!(!verify_password("wrong-horse", &stored).unwrap());
    }

    #[test]
    fn each_hash_gets_its_own_salt() {
        let first = hash_password("correct-horse").unwrap();
        let second = hash_password("correct-horse").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn plaintext_in_the_store_is_internal_error() {
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(ServiceError::Internal(_))
        ));
    }
}
