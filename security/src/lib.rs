//! Core `warden-security` crate for password hashing.
//!
//! This crate defines the `SchemeHasher` trait, which outlines what a password
//! hashing scheme must provide, and a `PasswordContext` that applies the
//! application-wide salt before delegating to the configured scheme (argon2id
//! or bcrypt). Verification dispatches on the scheme recorded in the stored
//! hash itself.

pub mod argon2id;
pub mod bcrypt2b;
pub mod context;
pub mod errors;
pub mod models;

pub use context::PasswordContext;
pub use errors::HashError;
pub use models::PasswordScheme;

/// A single password hashing scheme.
///
/// Implementations receive the already-salted secret and produce a
/// self-describing hash string (scheme, parameters and per-hash salt encoded
/// in the output).
pub trait SchemeHasher: Send + Sync {
    /// The scheme this hasher produces.
    fn scheme(&self) -> PasswordScheme;

    /// Hash `secret`, returning the encoded hash string.
    fn hash(&self, secret: &[u8]) -> Result<String, HashError>;

    /// Check `secret` against an encoded hash produced by this scheme.
    fn verify(&self, secret: &[u8], encoded: &str) -> Result<bool, HashError>;
}

/// Returns the hasher for `scheme` with its default parameters.
pub fn hasher_for(scheme: PasswordScheme) -> Box<dyn SchemeHasher> {
    match scheme {
        PasswordScheme::Argon2id => Box::new(argon2id::Argon2Hasher::default()),
        PasswordScheme::Bcrypt => Box::new(bcrypt2b::BcryptHasher::default()),
    }
}
