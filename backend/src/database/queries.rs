//! Database query functions (Data Access Objects).
//!
//! This module centralizes all direct database operations. Every function
//! takes a `&mut SqliteConnection`, so callers can run them on a pooled
//! connection or inside a transaction (`&mut *tx`).
//!
//! The create-if-absent helpers are single `INSERT ... ON CONFLICT DO NOTHING`
//! statements followed by a read, so two processes seeding at once cannot
//! trip over the unique constraints.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::database::models::{NewUser, Role, User, UserChanges};
use crate::errors::AppError;

const USER_COLUMNS: &str = "id, email, password, active, confirmed_at, last_login_at, \
     current_login_at, last_login_ip, current_login_ip, login_count";

// Roles

pub async fn find_role(conn: &mut SqliteConnection, id: i64) -> Result<Option<Role>, AppError> {
    let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM role WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(role)
}

pub async fn find_role_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Role>, AppError> {
    let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM role WHERE name = ?1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(role)
}

pub async fn list_roles(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT id, name, description FROM role ORDER BY id LIMIT ?1 OFFSET ?2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(roles)
}

pub async fn all_roles(conn: &mut SqliteConnection) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_as::<_, Role>("SELECT id, name, description FROM role ORDER BY name")
        .fetch_all(conn)
        .await?;
    Ok(roles)
}

pub async fn count_roles(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM role")
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Insert a role. A taken name is reported as `AppError::Conflict`.
pub async fn insert_role(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Role, AppError> {
    let result = sqlx::query_as::<_, Role>(
        "INSERT INTO role (name, description) VALUES (?1, ?2) RETURNING id, name, description",
    )
    .bind(name)
    .bind(description)
    .fetch_one(conn)
    .await;
    conflict_on_unique(result.map_err(AppError::from), || {
        format!("role '{name}' already exists")
    })
}

/// Return the role called `name`, creating it with `description` if absent.
/// An existing role is returned as-is, never updated.
pub async fn find_or_create_role(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> Result<(Role, bool), AppError> {
    let inserted = sqlx::query(
        "INSERT INTO role (name, description) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
    )
    .bind(name)
    .bind(description)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        == 1;

    let role = find_role_by_name(conn, name)
        .await?
        .ok_or_else(|| AppError::Internal(format!("role '{name}' vanished after insert")))?;
    Ok((role, inserted))
}

pub async fn update_role(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Role>, AppError> {
    let result = sqlx::query_as::<_, Role>(
        "UPDATE role SET name = ?2, description = ?3 WHERE id = ?1 \
         RETURNING id, name, description",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(conn)
    .await;
    conflict_on_unique(result.map_err(AppError::from), || {
        format!("role '{name}' already exists")
    })
}

pub async fn delete_role(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let affected = sqlx::query("DELETE FROM role WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(affected == 1)
}

// Users

pub async fn find_user(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE id = ?1"#);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, AppError> {
    let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = ?1"#);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn list_users(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, AppError> {
    let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" ORDER BY id LIMIT ?1 OFFSET ?2"#);
    let users = sqlx::query_as::<_, User>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub async fn count_users(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "user""#)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Insert a user. A taken email is reported as `AppError::Conflict`.
pub async fn insert_user(conn: &mut SqliteConnection, new: &NewUser) -> Result<User, AppError> {
    let sql = format!(
        r#"INSERT INTO "user" (email, password, active, confirmed_at)
           VALUES (?1, ?2, ?3, ?4) RETURNING {USER_COLUMNS}"#
    );
    let result = sqlx::query_as::<_, User>(&sql)
        .bind(&new.email)
        .bind(&new.password)
        .bind(new.active)
        .bind(new.confirmed_at)
        .fetch_one(conn)
        .await;
    conflict_on_unique(result.map_err(AppError::from), || {
        format!("user '{}' already exists", new.email)
    })
}

/// Return the user with `new.email`, inserting `new` if absent. An existing
/// user is returned untouched.
pub async fn create_user_if_absent(
    conn: &mut SqliteConnection,
    new: &NewUser,
) -> Result<(User, bool), AppError> {
    let inserted = sqlx::query(
        r#"INSERT INTO "user" (email, password, active, confirmed_at)
           VALUES (?1, ?2, ?3, ?4) ON CONFLICT(email) DO NOTHING"#,
    )
    .bind(&new.email)
    .bind(&new.password)
    .bind(new.active)
    .bind(new.confirmed_at)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        == 1;

    let user = find_user_by_email(conn, &new.email)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user '{}' vanished after insert", new.email)))?;
    Ok((user, inserted))
}

pub async fn update_user(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &UserChanges,
) -> Result<Option<User>, AppError> {
    let sql = format!(
        r#"UPDATE "user" SET email = ?2, password = ?3, active = ?4, confirmed_at = ?5
           WHERE id = ?1 RETURNING {USER_COLUMNS}"#
    );
    let result = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password)
        .bind(changes.active)
        .bind(changes.confirmed_at)
        .fetch_optional(conn)
        .await;
    conflict_on_unique(result.map_err(AppError::from), || {
        format!("user '{}' already exists", changes.email)
    })
}

pub async fn set_password(
    conn: &mut SqliteConnection,
    id: i64,
    password_hash: &str,
) -> Result<(), AppError> {
    sqlx::query(r#"UPDATE "user" SET password = ?2 WHERE id = ?1"#)
        .bind(id)
        .bind(password_hash)
        .execute(conn)
        .await?;
    Ok(())
}

/// Rotate the login tracking columns after a successful login.
///
/// The previous "current" values become the "last" values (falling back to
/// this login when there was none) and the counter is incremented.
pub async fn record_login(
    conn: &mut SqliteConnection,
    id: i64,
    at: DateTime<Utc>,
    ip: Option<&str>,
) -> Result<Option<User>, AppError> {
    let sql = format!(
        r#"UPDATE "user" SET
               last_login_at = COALESCE(current_login_at, ?2),
               current_login_at = ?2,
               last_login_ip = COALESCE(current_login_ip, ?3),
               current_login_ip = ?3,
               login_count = login_count + 1
           WHERE id = ?1 RETURNING {USER_COLUMNS}"#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(at)
        .bind(ip)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn delete_user(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let affected = sqlx::query(r#"DELETE FROM "user" WHERE id = ?1"#)
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(affected == 1)
}

// Associations

pub async fn roles_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.description FROM role r \
         JOIN roles_users ru ON ru.role_id = r.id \
         WHERE ru.user_id = ?1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(roles)
}

/// Grant a role. Returns false when the user already held it.
pub async fn add_role_to_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_id: i64,
) -> Result<bool, AppError> {
    let affected = sqlx::query(
        "INSERT INTO roles_users (user_id, role_id) VALUES (?1, ?2) \
         ON CONFLICT(user_id, role_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(affected == 1)
}

/// Revoke a role. Returns false when the user did not hold it.
pub async fn remove_role_from_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_id: i64,
) -> Result<bool, AppError> {
    let affected = sqlx::query("DELETE FROM roles_users WHERE user_id = ?1 AND role_id = ?2")
        .bind(user_id)
        .bind(role_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(affected == 1)
}

/// Replace the user's role set with exactly `role_ids`.
pub async fn set_user_roles(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM roles_users WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for role_id in role_ids {
        add_role_to_user(&mut *conn, user_id, *role_id).await?;
    }
    Ok(())
}

fn conflict_on_unique<T>(
    result: Result<T, AppError>,
    message: impl FnOnce() -> String,
) -> Result<T, AppError> {
    match result {
        Err(e) if e.is_unique_violation() => Err(AppError::Conflict(message())),
        other => other,
    }
}
