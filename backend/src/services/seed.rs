//! Idempotent seeding of baseline roles and accounts.
//!
//! Runs once at startup, before the listener is bound. Every step is a
//! create-if-absent or grant-if-missing, so running it on every cold start
//! (or from two processes at once) leaves exactly one copy of each row.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::models::{ADMIN_ROLE, END_USER_ROLE};
use crate::auth::service::AuthService;
use crate::config::SeedConfig;
use crate::database;
use crate::database::models::NewUser;
use crate::database::queries;
use crate::errors::AppError;

pub struct SeedRole {
    pub name: &'static str,
    pub description: &'static str,
}

pub const SEED_ROLES: [SeedRole; 2] = [
    SeedRole {
        name: ADMIN_ROLE,
        description: "Administrator",
    },
    SeedRole {
        name: END_USER_ROLE,
        description: "End user",
    },
];

pub struct SeedAccount {
    pub email: &'static str,
    pub role: &'static str,
}

impl SeedAccount {
    fn password<'a>(&self, seed: &'a SeedConfig) -> &'a str {
        if self.role == ADMIN_ROLE {
            &seed.admin_password
        } else {
            &seed.end_user_password
        }
    }
}

pub const SEED_ACCOUNTS: [SeedAccount; 2] = [
    SeedAccount {
        email: "someone",
        role: END_USER_ROLE,
    },
    SeedAccount {
        email: "admin",
        role: ADMIN_ROLE,
    },
];

/// What a seeding run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub users_created: usize,
    pub grants_added: usize,
}

/// Ensure the schema, the canonical roles, the seed accounts and their role
/// grants exist. Any storage failure aborts the run; the next start retries.
pub async fn run(
    db: &SqlitePool,
    auth: &AuthService,
    seed: &SeedConfig,
) -> Result<SeedReport, AppError> {
    database::create_all(db).await?;
    let mut report = SeedReport::default();

    let mut tx = db.begin().await?;
    for role in &SEED_ROLES {
        let (role, created) =
            queries::find_or_create_role(&mut tx, role.name, Some(role.description)).await?;
        if created {
            info!(role = %role.name, "created role");
            report.roles_created += 1;
        } else {
            debug!(role = %role.name, "role already exists");
        }
    }

    for account in &SEED_ACCOUNTS {
        if queries::find_user_by_email(&mut tx, account.email).await?.is_some() {
            debug!(email = account.email, "seed account already exists");
            continue;
        }
        // Each account gets its own hash of its own password.
        let hash = auth.hash_password(account.password(seed)).await?;
        let new = NewUser::new(account.email, Some(hash));
        let (user, created) = queries::create_user_if_absent(&mut tx, &new).await?;
        if created {
            info!(email = %user.email, "created seed account");
            report.users_created += 1;
        }
    }
    tx.commit().await?;

    let mut tx = db.begin().await?;
    for account in &SEED_ACCOUNTS {
        let user = queries::find_user_by_email(&mut tx, account.email)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("seed account '{}' missing", account.email))
            })?;
        let role = queries::find_role_by_name(&mut tx, account.role)
            .await?
            .ok_or_else(|| AppError::Internal(format!("seed role '{}' missing", account.role)))?;
        if queries::add_role_to_user(&mut tx, user.id, role.id).await? {
            info!(email = account.email, role = account.role, "granted role");
            report.grants_added += 1;
        }
    }
    tx.commit().await?;

    info!(
        roles_created = report.roles_created,
        users_created = report.users_created,
        grants_added = report.grants_added,
        "seeding complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::service::test_service;
    use crate::database::test_pool;
    use std::collections::BTreeSet;

    async fn role_names_of(pool: &SqlitePool, email: &str) -> BTreeSet<String> {
        let mut conn = pool.acquire().await.unwrap();
        let user = queries::find_user_by_email(&mut conn, email).await.unwrap().unwrap();
        queries::roles_for_user(&mut conn, user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|role| role.name)
            .collect()
    }

    #[tokio::test]
    async fn seeding_an_empty_store() {
        let pool = test_pool().await;
        let auth = test_service(pool.clone());

        let report = run(&pool, &auth, &SeedConfig::default()).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                roles_created: 2,
                users_created: 2,
                grants_added: 2,
            }
        );

        let mut conn = pool.acquire().await.unwrap();
        let roles: BTreeSet<String> = queries::all_roles(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|role| role.name)
            .collect();
        assert_eq!(roles, BTreeSet::from(["admin".to_string(), "end-user".to_string()]));
        assert_eq!(queries::count_users(&mut conn).await.unwrap(), 2);
        drop(conn);

        assert_eq!(role_names_of(&pool, "someone").await, BTreeSet::from(["end-user".to_string()]));
        assert_eq!(role_names_of(&pool, "admin").await, BTreeSet::from(["admin".to_string()]));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = test_pool().await;
        let auth = test_service(pool.clone());
        let seed = SeedConfig::default();

        run(&pool, &auth, &seed).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let admin_before = queries::find_user_by_email(&mut conn, "admin").await.unwrap().unwrap();
        drop(conn);

        for _ in 0..3 {
            let report = run(&pool, &auth, &seed).await.unwrap();
            assert_eq!(report, SeedReport::default());
        }

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(queries::count_roles(&mut conn).await.unwrap(), 2);
        assert_eq!(queries::count_users(&mut conn).await.unwrap(), 2);
        let admin_after = queries::find_user_by_email(&mut conn, "admin").await.unwrap().unwrap();
        assert_eq!(admin_before.password, admin_after.password);
        drop(conn);

        assert_eq!(role_names_of(&pool, "someone").await, BTreeSet::from(["end-user".to_string()]));
        assert_eq!(role_names_of(&pool, "admin").await, BTreeSet::from(["admin".to_string()]));
    }

    #[tokio::test]
    async fn seed_accounts_get_distinct_hashes() {
        let pool = test_pool().await;
        let auth = test_service(pool.clone());
        let seed = SeedConfig {
            end_user_password: "same".to_string(),
            admin_password: "same".to_string(),
        };
        run(&pool, &auth, &seed).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let someone = queries::find_user_by_email(&mut conn, "someone").await.unwrap().unwrap();
        let admin = queries::find_user_by_email(&mut conn, "admin").await.unwrap().unwrap();
        drop(conn);

        let someone_hash = someone.password.unwrap();
        let admin_hash = admin.password.unwrap();
        assert_ne!(someone_hash, admin_hash);
        assert_ne!(someone_hash, "same");
        assert!(auth.verify_password("same", &someone_hash).await.unwrap());
        assert!(auth.verify_password("same", &admin_hash).await.unwrap());
    }

    #[tokio::test]
    async fn existing_rows_are_not_modified() {
        let pool = test_pool().await;
        let auth = test_service(pool.clone());

        let mut conn = pool.acquire().await.unwrap();
        queries::insert_role(&mut conn, "admin", Some("Keeps its text")).await.unwrap();
        let existing = queries::insert_user(&mut conn, &NewUser::new("admin", None)).await.unwrap();
        drop(conn);

        let report = run(&pool, &auth, &SeedConfig::default()).await.unwrap();
        assert_eq!(report.roles_created, 1);
        assert_eq!(report.users_created, 1);
        assert_eq!(report.grants_added, 2);

        let mut conn = pool.acquire().await.unwrap();
        let admin_role = queries::find_role_by_name(&mut conn, "admin").await.unwrap().unwrap();
        assert_eq!(admin_role.description.as_deref(), Some("Keeps its text"));
        let admin = queries::find_user_by_email(&mut conn, "admin").await.unwrap().unwrap();
        assert_eq!(admin.id, existing.id);
        assert!(admin.password.is_none());
    }

    #[tokio::test]
    async fn seed_passwords_log_in() {
        let pool = test_pool().await;
        let auth = test_service(pool.clone());
        let seed = SeedConfig::default();
        run(&pool, &auth, &seed).await.unwrap();

        let admin = auth.authenticate("admin", &seed.admin_password, None).await.unwrap();
        assert_eq!(admin.login_count, 1);
        assert!(auth.authenticate("admin", &seed.end_user_password, None).await.is_err());
    }
}
