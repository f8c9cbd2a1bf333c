//! Defines the HTTP routes of the landing page and the dashboard.

use axum::routing::get;
use axum::Router;

use super::handlers::{dashboard, index};
use crate::state::AppState;

pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
}
