//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the connection pool and
//! creating the schema (`role`, `"user"` and the `roles_users` join table)
//! when it does not exist yet.

pub mod models;
pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS role (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(80) NOT NULL UNIQUE,
        description VARCHAR(255)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "user" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email VARCHAR(255) NOT NULL UNIQUE COLLATE NOCASE,
        password VARCHAR(255),
        active BOOLEAN NOT NULL DEFAULT 1,
        confirmed_at DATETIME,
        last_login_at DATETIME,
        current_login_at DATETIME,
        last_login_ip VARCHAR(255),
        current_login_ip VARCHAR(255),
        login_count INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS roles_users (
        user_id INTEGER NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
        role_id INTEGER NOT NULL REFERENCES role(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, role_id)
    )"#,
];

/// Open the connection pool described by `config`.
///
/// In-memory databases exist per connection, so they get a single connection
/// that is never recycled.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

    let pool = if is_in_memory(&config.url) {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool.connect_with(options).await?;
    tracing::info!(url = %redact_url(&config.url), "database pool ready");
    Ok(pool)
}

/// Create any table that does not exist yet.
pub async fn create_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://<redacted>{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = connect(&config).await.unwrap();
    create_all(&pool).await.unwrap();
    pool
}
