//! Application context shared by every handler.
//!
//! Built once in `main` and handed to the router; nothing in the crate reaches
//! for process-wide globals.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::service::AuthService;
use crate::config::Config;
use crate::errors::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: SqlitePool,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool) -> Result<Self, AppError> {
        let auth = AuthService::new(db.clone(), &config.security)?;
        Ok(Self::with_auth(config, db, auth))
    }

    pub fn with_auth(config: Config, db: SqlitePool, auth: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            db,
            auth: Arc::new(auth),
        }
    }
}
