//! Handler functions for the administration API.
//!
//! Every handler takes an `Accessible<View>` first, so the access rule runs
//! before the body is read. User writes (row plus role set) commit together.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqliteConnection;
use tracing::info;

use super::forms::{FormSchema, RoleForm, UserForm};
use super::policy::{Accessible, AdminIndex, ModelView, RoleAdmin, UserAdmin};
use super::views::{AdminIndexView, ListParams, ListResponse, UserView, ViewLink};
use crate::database::models::{NewUser, Role, UserChanges};
use crate::database::queries;
use crate::errors::AppError;
use crate::state::AppState;

fn link<V: ModelView>() -> ViewLink {
    ViewLink {
        name: V::NAME,
        label: V::LABEL,
        url: format!("/admin/{}", V::NAME),
    }
}

/// `GET /admin/`
pub async fn index(_admin: Accessible<AdminIndex>) -> Json<AdminIndexView> {
    Json(AdminIndexView {
        views: vec![link::<UserAdmin>(), link::<RoleAdmin>()],
    })
}

/// Look up role ids by name; an unknown name is a validation error.
async fn resolve_roles(
    conn: &mut SqliteConnection,
    names: &[String],
) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let role = queries::find_role_by_name(&mut *conn, name)
            .await?
            .ok_or_else(|| AppError::Validation(format!("unknown role '{name}'")))?;
        ids.push(role.id);
    }
    Ok(ids)
}

fn user_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("user {id} not found"))
}

fn role_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("role {id} not found"))
}

// Users

/// `GET /admin/user`
pub async fn list_users(
    _admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<UserView>>, AppError> {
    let params = params.normalized();
    let mut conn = state.db.acquire().await?;
    let total = queries::count_users(&mut conn).await?;
    let users = queries::list_users(&mut conn, params.limit(), params.offset()).await?;

    let mut items = Vec::with_capacity(users.len());
    for user in users {
        let roles = queries::roles_for_user(&mut conn, user.id).await?;
        items.push(UserView::new(user, roles));
    }
    Ok(Json(ListResponse {
        items,
        total,
        page: params.page,
        page_size: params.page_size,
    }))
}

/// `GET /admin/user/form`
pub async fn user_form(
    _admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
) -> Result<Json<FormSchema>, AppError> {
    let mut conn = state.db.acquire().await?;
    let choices = queries::all_roles(&mut conn)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();
    Ok(Json(UserForm::schema(choices)))
}

/// `POST /admin/user`
pub async fn create_user(
    admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
    Json(form): Json<UserForm>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let form = form.validate()?;
    let password = match form.new_password() {
        Some(plaintext) => Some(state.auth.hash_password(plaintext).await?),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let role_ids = resolve_roles(&mut tx, &form.roles).await?;
    let new = NewUser {
        email: form.email.clone(),
        password,
        active: form.active,
        confirmed_at: form.confirmed_at,
    };
    let user = queries::insert_user(&mut tx, &new).await?;
    queries::set_user_roles(&mut tx, user.id, &role_ids).await?;
    let roles = queries::roles_for_user(&mut tx, user.id).await?;
    tx.commit().await?;

    info!(by = admin.user.user.id, user_id = user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(UserView::new(user, roles))))
}

/// `GET /admin/user/{id}`
pub async fn get_user(
    _admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    let mut conn = state.db.acquire().await?;
    let user = queries::find_user(&mut conn, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    let roles = queries::roles_for_user(&mut conn, id).await?;
    Ok(Json(UserView::new(user, roles)))
}

/// `PUT /admin/user/{id}`
///
/// A blank `new_password` leaves the stored hash exactly as it was.
pub async fn update_user(
    admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<UserForm>,
) -> Result<Json<UserView>, AppError> {
    let form = form.validate()?;
    let new_hash = match form.new_password() {
        Some(plaintext) => Some(state.auth.hash_password(plaintext).await?),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let current = queries::find_user(&mut tx, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    let role_ids = resolve_roles(&mut tx, &form.roles).await?;
    let changes = UserChanges {
        email: form.email.clone(),
        password: new_hash.or(current.password),
        active: form.active,
        confirmed_at: form.confirmed_at,
    };
    let user = queries::update_user(&mut tx, id, &changes)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    queries::set_user_roles(&mut tx, id, &role_ids).await?;
    let roles = queries::roles_for_user(&mut tx, id).await?;
    tx.commit().await?;

    info!(
        by = admin.user.user.id,
        user_id = id,
        password_changed = form.new_password().is_some(),
        "user updated"
    );
    Ok(Json(UserView::new(user, roles)))
}

/// `DELETE /admin/user/{id}`
pub async fn delete_user(
    admin: Accessible<UserAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    if !queries::delete_user(&mut conn, id).await? {
        return Err(user_not_found(id));
    }
    info!(by = admin.user.user.id, user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Roles

/// `GET /admin/role`
pub async fn list_roles(
    _admin: Accessible<RoleAdmin>,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Role>>, AppError> {
    let params = params.normalized();
    let mut conn = state.db.acquire().await?;
    let total = queries::count_roles(&mut conn).await?;
    let items = queries::list_roles(&mut conn, params.limit(), params.offset()).await?;
    Ok(Json(ListResponse {
        items,
        total,
        page: params.page,
        page_size: params.page_size,
    }))
}

/// `GET /admin/role/form`
pub async fn role_form(_admin: Accessible<RoleAdmin>) -> Json<FormSchema> {
    Json(RoleForm::schema())
}

/// `POST /admin/role`
pub async fn create_role(
    admin: Accessible<RoleAdmin>,
    State(state): State<AppState>,
    Json(form): Json<RoleForm>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let form = form.validate()?;
    let mut conn = state.db.acquire().await?;
    let role = queries::insert_role(&mut conn, &form.name, form.description.as_deref()).await?;
    info!(by = admin.user.user.id, role = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// `GET /admin/role/{id}`
pub async fn get_role(
    _admin: Accessible<RoleAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    let mut conn = state.db.acquire().await?;
    let role = queries::find_role(&mut conn, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    Ok(Json(role))
}

/// `PUT /admin/role/{id}`
pub async fn update_role(
    admin: Accessible<RoleAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<RoleForm>,
) -> Result<Json<Role>, AppError> {
    let form = form.validate()?;
    let mut conn = state.db.acquire().await?;
    let role = queries::update_role(&mut conn, id, &form.name, form.description.as_deref())
        .await?
        .ok_or_else(|| role_not_found(id))?;
    info!(by = admin.user.user.id, role_id = id, role = %role.name, "role updated");
    Ok(Json(role))
}

/// `DELETE /admin/role/{id}`
pub async fn delete_role(
    admin: Accessible<RoleAdmin>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    if !queries::delete_role(&mut conn, id).await? {
        return Err(role_not_found(id));
    }
    info!(by = admin.user.user.id, role_id = id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}
