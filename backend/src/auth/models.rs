//! Data structures for authentication-related entities.
//!
//! This module defines the capability traits the data model satisfies
//! (`HasRoles`, `Authenticatable`), the authenticated principal, session
//! token claims and the login form.

use serde::{Deserialize, Serialize};

use crate::database::models::{Role, User};

/// Role whose holders may use the administration views.
pub const ADMIN_ROLE: &str = "admin";

/// Role given to regular accounts.
pub const END_USER_ROLE: &str = "end-user";

/// Something that holds a set of roles.
pub trait HasRoles {
    fn roles(&self) -> &[Role];

    fn has_role(&self, name: &str) -> bool {
        self.roles().iter().any(|role| role.name == name)
    }

    fn role_names(&self) -> Vec<String> {
        self.roles().iter().map(|role| role.name.clone()).collect()
    }
}

/// Something that can log in with a password.
pub trait Authenticatable {
    fn is_active(&self) -> bool;
    fn password_hash(&self) -> Option<&str>;
}

impl Authenticatable for User {
    fn is_active(&self) -> bool {
        self.active
    }

    fn password_hash(&self) -> Option<&str> {
        self.password.as_deref().filter(|hash| !hash.is_empty())
    }
}

/// The logged-in user of a request, with the roles they hold right now.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub roles: Vec<Role>,
}

impl HasRoles for AuthenticatedUser {
    fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Query string of `GET /login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}
