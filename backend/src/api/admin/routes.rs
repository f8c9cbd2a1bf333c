//! Defines the HTTP routes of the administration API.
//!
//! Paths are registered in full (`/admin/...`) and merged into the main
//! router, so `/admin` and `/admin/` both reach the index.

use axum::routing::get;
use axum::Router;

use super::handlers::{
    create_role, create_user, delete_role, delete_user, get_role, get_user, index, list_roles,
    list_users, role_form, update_role, update_user, user_form,
};
use crate::state::AppState;

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/", get(index))
        .route("/admin/user", get(list_users).post(create_user))
        .route("/admin/user/form", get(user_form))
        .route(
            "/admin/user/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/role", get(list_roles).post(create_role))
        .route("/admin/role/form", get(role_form))
        .route(
            "/admin/role/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
}
