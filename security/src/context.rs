//! Salted password context.
//!
//! Every plaintext is first keyed with HMAC-SHA512 under the application-wide
//! salt and hex encoded; the result is what the scheme hasher sees. A leaked
//! table of hashes is therefore useless without the configured salt as well.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::errors::HashError;
use crate::models::PasswordScheme;
use crate::{hasher_for, SchemeHasher};

type HmacSha512 = Hmac<Sha512>;

pub struct PasswordContext {
    hasher: Box<dyn SchemeHasher>,
    salt: Vec<u8>,
}

impl PasswordContext {
    /// Build a context hashing new passwords with `scheme`.
    pub fn new(scheme: PasswordScheme, salt: &str) -> Result<Self, HashError> {
        Self::with_hasher(hasher_for(scheme), salt)
    }

    /// Build a context around an explicitly configured hasher.
    pub fn with_hasher(hasher: Box<dyn SchemeHasher>, salt: &str) -> Result<Self, HashError> {
        if salt.is_empty() {
            return Err(HashError::EmptySalt);
        }
        Ok(Self {
            hasher,
            salt: salt.as_bytes().to_vec(),
        })
    }

    /// Scheme used for new hashes.
    pub fn scheme(&self) -> PasswordScheme {
        self.hasher.scheme()
    }

    /// Hash a plaintext password for storage.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let keyed = self.keyed(password)?;
        self.hasher.hash(keyed.as_bytes())
    }

    /// Verify a plaintext password against a stored hash of any supported scheme.
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, HashError> {
        let scheme = PasswordScheme::detect(encoded).ok_or(HashError::UnknownFormat)?;
        let keyed = self.keyed(password)?;
        if scheme == self.hasher.scheme() {
            self.hasher.verify(keyed.as_bytes(), encoded)
        } else {
            tracing::debug!(%scheme, "verifying password stored under a non-default scheme");
            hasher_for(scheme).verify(keyed.as_bytes(), encoded)
        }
    }

    /// True when `encoded` was produced by a scheme other than the current one.
    pub fn needs_rehash(&self, encoded: &str) -> bool {
        PasswordScheme::detect(encoded) != Some(self.hasher.scheme())
    }

    fn keyed(&self, password: &str) -> Result<String, HashError> {
        let mut mac =
            HmacSha512::new_from_slice(&self.salt).map_err(|e| HashError::Hash(e.to_string()))?;
        mac.update(password.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcrypt2b::BcryptHasher;

    fn bcrypt_context(salt: &str) -> PasswordContext {
        PasswordContext::with_hasher(Box::new(BcryptHasher::with_cost(4)), salt).unwrap()
    }

    #[test]
    fn empty_salt_is_rejected() {
        assert!(matches!(
            PasswordContext::new(PasswordScheme::Argon2id, ""),
            Err(HashError::EmptySalt)
        ));
    }

    #[test]
    fn hash_never_equals_plaintext() {
        let ctx = PasswordContext::new(PasswordScheme::Argon2id, "pepper").unwrap();
        let hash = ctx.hash("123").unwrap();
        assert_ne!(hash, "123");
        assert!(ctx.verify("123", &hash).unwrap());
        assert!(!ctx.verify("124", &hash).unwrap());
    }

    #[test]
    fn salt_is_part_of_the_credential() {
        let hash = bcrypt_context("salt-one").hash("secret").unwrap();
        assert!(bcrypt_context("salt-one").verify("secret", &hash).unwrap());
        assert!(!bcrypt_context("salt-two").verify("secret", &hash).unwrap());
    }

    #[test]
    fn verifies_hashes_from_another_scheme() {
        let legacy = bcrypt_context("pepper");
        let hash = legacy.hash("secret").unwrap();

        let current = PasswordContext::new(PasswordScheme::Argon2id, "pepper").unwrap();
        assert!(current.verify("secret", &hash).unwrap());
        assert!(current.needs_rehash(&hash));
        assert!(!legacy.needs_rehash(&hash));
    }

    #[test]
    fn unknown_hash_format() {
        let ctx = bcrypt_context("pepper");
        assert!(matches!(ctx.verify("123", "123"), Err(HashError::UnknownFormat)));
    }
}
