//! Rust structs that represent database table mappings.
//!
//! `User` deliberately does not implement `Serialize`: it carries the password
//! hash. API responses go through the view types in `api::admin`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row of the `role` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A row of the `"user"` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Salted hash; never plaintext.
    pub password: Option<String>,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub current_login_ip: Option<String>,
    pub login_count: i64,
}

/// Columns supplied when inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: Option<String>,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: Option<String>) -> Self {
        Self {
            email: email.into(),
            password,
            active: true,
            confirmed_at: None,
        }
    }
}

/// Editable columns of an existing user. Login tracking columns are left to
/// `queries::record_login`.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub email: String,
    pub password: Option<String>,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}
