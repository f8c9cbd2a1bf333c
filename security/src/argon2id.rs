//! Argon2id implementation of `SchemeHasher`.
//!
//! Produces PHC strings (`$argon2id$v=19$...`) with a random per-hash salt.

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::errors::HashError;
use crate::models::PasswordScheme;
use crate::SchemeHasher;

#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl SchemeHasher for Argon2Hasher {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Argon2id
    }

    fn hash(&self, secret: &[u8]) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, secret: &[u8], encoded: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(encoded).map_err(|e| HashError::Verify(e.to_string()))?;
        match self.argon2.verify_password(secret, &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Verify(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash(b"correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(b"correct horse", &hash).unwrap());
        assert!(!hasher.verify(b"battery staple", &hash).unwrap());
    }

    #[test]
    fn same_secret_gets_distinct_salts() {
        let hasher = Argon2Hasher::default();
        let a = hasher.hash(b"123").unwrap();
        let b = hasher.hash(b"123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = Argon2Hasher::default();
        assert!(matches!(hasher.verify(b"x", "not-a-hash"), Err(HashError::Verify(_))));
    }
}
