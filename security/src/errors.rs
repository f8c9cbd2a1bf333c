//! Custom error types specific to the `warden-security` crate.
//!
//! These cover failures while hashing a password, verifying one, or reading a
//! stored hash whose format is not recognised.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("hashing failed: {0}")]
    Hash(String),

    #[error("verification failed: {0}")]
    Verify(String),

    #[error("unrecognised password hash format")]
    UnknownFormat,

    #[error("unsupported password scheme: {0}")]
    UnsupportedScheme(String),

    #[error("password salt must not be empty")]
    EmptySalt,
}
