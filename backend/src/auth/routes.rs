//! Defines the HTTP routes specifically for authentication.
//!
//! Login and logout live at the site root (`/login`, `/logout`) and are
//! merged into the main router.

use axum::routing::get;
use axum::Router;

use super::handlers::{login, logout, show_login};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(show_login).post(login))
        .route("/logout", get(logout))
}
