//! Authentication module for managing user accounts, sessions, and access control.
//!
//! This module provides the authentication collaborator the rest of the
//! application relies on: the current principal, role checks, password
//! hashing, login-required gating and login tracking.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

// Re-exports for convenience
pub use errors::AuthError;
pub use middleware::{ClientAddr, LoginRequired, Principal};
pub use models::{AuthenticatedUser, Authenticatable, HasRoles, ADMIN_ROLE, END_USER_ROLE};
pub use routes::auth_router;
pub use service::AuthService;
