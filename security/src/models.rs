//! Scheme identifiers shared by the hashers and the configuration layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HashError;

/// Supported password hashing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PasswordScheme {
    #[default]
    #[serde(rename = "argon2")]
    Argon2id,
    #[serde(rename = "bcrypt")]
    Bcrypt,
}

impl PasswordScheme {
    /// Identifier used in configuration files.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Argon2id => "argon2",
            Self::Bcrypt => "bcrypt",
        }
    }

    /// Works out which scheme produced an encoded hash from its prefix.
    pub fn detect(encoded: &str) -> Option<Self> {
        if encoded.starts_with("$argon2") {
            Some(Self::Argon2id)
        } else if ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| encoded.starts_with(prefix))
        {
            Some(Self::Bcrypt)
        } else {
            None
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for PasswordScheme {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2" | "argon2id" => Ok(Self::Argon2id),
            "bcrypt" => Ok(Self::Bcrypt),
            other => Err(HashError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers() {
        assert_eq!("argon2".parse::<PasswordScheme>().unwrap(), PasswordScheme::Argon2id);
        assert_eq!("Argon2id".parse::<PasswordScheme>().unwrap(), PasswordScheme::Argon2id);
        assert_eq!("bcrypt".parse::<PasswordScheme>().unwrap(), PasswordScheme::Bcrypt);
        assert!(matches!(
            "pbkdf2_sha512".parse::<PasswordScheme>(),
            Err(HashError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn detects_scheme_from_hash_prefix() {
        assert_eq!(
            PasswordScheme::detect("$argon2id$v=19$m=19456,t=2,p=1$abc$def"),
            Some(PasswordScheme::Argon2id)
        );
        assert_eq!(
            PasswordScheme::detect("$2b$04$abcdefghijklmnopqrstuv"),
            Some(PasswordScheme::Bcrypt)
        );
        assert_eq!(PasswordScheme::detect("123"), None);
    }
}
