//! Central module for organizing the application's HTTP surface.
//!
//! This module assembles the landing pages, the authentication routes and the
//! administration API into one router, with request logging applied to all
//! of them.

pub mod admin;
pub mod pages;

use axum::{middleware, Router};

use crate::auth::auth_router;
use crate::middleware::log_requests;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::routes::pages_router())
        .merge(auth_router())
        .merge(admin::admin_router())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
