//! Module for the administration API.
//!
//! JSON endpoints for managing users and roles, open only to principals
//! holding the admin role.

pub mod forms;
pub mod handlers;
pub mod policy;
pub mod routes;
pub mod views;

pub use policy::{Accessible, ModelView, RoleAdmin, UserAdmin};
pub use routes::admin_router;
