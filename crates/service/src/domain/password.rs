//! One-way password hashing for `User`.

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use rand::rngs::OsRng;

use crate::errors::StorageError;

/// Hash a plaintext password into an Argon2id PHC string.
pub fn hash_password(plain: &str) -> Result<String, StorageError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StorageError::Hash(e.to_string()))
}

/// Check a plaintext candidate against a stored PHC string.
/// Unparseable hashes never verify.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let a = hash_password("pwd").unwrap();
        let b = hash_password("pwd").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(verify_password("pwd", &a));
        assert!(!verify_password("nope", &a));
        assert!(!verify_password("pwd", "not-a-phc-string"));
    }
}
