//! Bcrypt implementation of `SchemeHasher`.
//!
//! Produces `$2b$` hashes. Bcrypt only reads the first 72 bytes of its input;
//! the salted secret handed in by `PasswordContext` is a hex digest, so the
//! truncated prefix still carries 288 bits of it.

use crate::errors::HashError;
use crate::models::PasswordScheme;
use crate::SchemeHasher;

/// Bcrypt cost factor used when none is given.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::with_cost(DEFAULT_COST)
    }
}

impl SchemeHasher for BcryptHasher {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Bcrypt
    }

    fn hash(&self, secret: &[u8]) -> Result<String, HashError> {
        bcrypt::hash(secret, self.cost).map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, secret: &[u8], encoded: &str) -> Result<bool, HashError> {
        bcrypt::verify(secret, encoded).map_err(|e| HashError::Verify(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hasher = BcryptHasher::with_cost(4);
        let hash = hasher.hash(b"SecurePassword123!").unwrap();
        assert!(hash.starts_with("$2b$04$"));
        assert!(hasher.verify(b"SecurePassword123!", &hash).unwrap());
        assert!(!hasher.verify(b"WrongPassword", &hash).unwrap());
    }

    #[test]
    fn invalid_hash_is_an_error() {
        let hasher = BcryptHasher::with_cost(4);
        assert!(hasher.verify(b"x", "$2b$nonsense").is_err());
    }
}
