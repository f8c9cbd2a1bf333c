//! Core business logic for the authentication system.
//!
//! This service handles password hashing and verification, credential
//! checks with login tracking, and session token issuance and validation.
//! Password work runs on the blocking thread pool so it never stalls the
//! async runtime.

use std::sync::Arc;

use chrono::Utc;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use tracing::{info, warn};
use warden_security::PasswordContext;

use crate::auth::errors::AuthError;
use crate::auth::models::{Authenticatable, AuthenticatedUser, SessionClaims};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::database::queries;
use crate::errors::AppError;

pub struct AuthService {
    db: SqlitePool,
    passwords: Arc<PasswordContext>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl_secs: i64,
    cookie_name: String,
    secure_cookie: bool,
}

impl AuthService {
    /// Build the service from the security settings.
    pub fn new(db: SqlitePool, config: &SecurityConfig) -> Result<Self, AppError> {
        let passwords = PasswordContext::new(config.password_hash, &config.password_salt)?;
        Ok(Self::with_passwords(db, passwords, config))
    }

    /// Build the service around an already configured password context.
    pub fn with_passwords(
        db: SqlitePool,
        passwords: PasswordContext,
        config: &SecurityConfig,
    ) -> Self {
        Self {
            db,
            passwords: Arc::new(passwords),
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation: Validation::default(),
            session_ttl_secs: i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX),
            cookie_name: config.session_cookie.clone(),
            secure_cookie: config.secure_cookie,
        }
    }

    /// Hash a plaintext password for storage.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String, AppError> {
        let passwords = Arc::clone(&self.passwords);
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || passwords.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
            .map_err(AppError::from)
    }

    /// Check a plaintext password against a stored hash.
    pub async fn verify_password(&self, plaintext: &str, hash: &str) -> Result<bool, AppError> {
        let passwords = Arc::clone(&self.passwords);
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || passwords.verify(&plaintext, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
            .map_err(AppError::from)
    }

    /// Check credentials and record the login on success.
    ///
    /// Unknown emails, accounts without a password and wrong passwords all
    /// yield `InvalidCredentials`; a correct password on a disabled account
    /// yields `Inactive`. Hashes made under a scheme other than the configured
    /// one are upgraded in place.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        client_ip: Option<&str>,
    ) -> Result<User, AppError> {
        let mut conn = self.db.acquire().await?;
        let user = queries::find_user_by_email(&mut conn, email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = user
            .password_hash()
            .ok_or(AuthError::InvalidCredentials)?
            .to_string();

        let matches = match self.verify_password(password, &hash).await {
            Ok(matches) => matches,
            Err(AppError::Hashing(e)) => {
                warn!(user_id = user.id, error = %e, "stored password hash is unusable");
                false
            }
            Err(e) => return Err(e),
        };
        if !matches {
            info!(user_id = user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active() {
            info!(user_id = user.id, "login rejected: account disabled");
            return Err(AuthError::Inactive.into());
        }

        if self.passwords.needs_rehash(&hash) {
            let upgraded = self.hash_password(password).await?;
            queries::set_password(&mut conn, user.id, &upgraded).await?;
            info!(user_id = user.id, scheme = %self.passwords.scheme(), "password hash upgraded");
        }

        let user = queries::record_login(&mut conn, user.id, Utc::now(), client_ip)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        info!(user_id = user.id, login_count = user.login_count, "login succeeded");
        Ok(user)
    }

    /// Issue a signed session token for `user`.
    pub fn issue_session(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            iat: now,
            exp: now.saturating_add(self.session_ttl_secs),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("cannot sign session: {e}")))
    }

    /// Validate a session token's signature and expiry.
    pub fn decode_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Session(e.to_string()))
    }

    /// Resolve session claims to the current principal.
    ///
    /// Users and roles are re-read on every call, so deactivation or a role
    /// change takes effect on the next request. Deleted or disabled users
    /// resolve to `None`.
    pub async fn load_principal(
        &self,
        claims: &SessionClaims,
    ) -> Result<Option<AuthenticatedUser>, AppError> {
        let mut conn = self.db.acquire().await?;
        let Some(user) = queries::find_user(&mut conn, claims.sub).await? else {
            return Ok(None);
        };
        if !user.is_active() {
            return Ok(None);
        }
        let roles = queries::roles_for_user(&mut conn, user.id).await?;
        Ok(Some(AuthenticatedUser { user, roles }))
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Cookie carrying a session token.
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        self.cookie(token.to_string(), Duration::seconds(self.session_ttl_secs))
    }

    /// Cookie that removes the session cookie from the browser.
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        self.cookie(String::new(), Duration::ZERO)
    }

    fn cookie(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
pub(crate) fn test_service(db: SqlitePool) -> AuthService {
    use warden_security::bcrypt2b::BcryptHasher;

    let config = SecurityConfig::default();
    let passwords =
        PasswordContext::with_hasher(Box::new(BcryptHasher::with_cost(4)), &config.password_salt)
            .unwrap();
    AuthService::with_passwords(db, passwords, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::test_pool;

    async fn seeded_user(svc: &AuthService, pool: &SqlitePool, active: bool) -> User {
        let hash = svc.hash_password("hunter22").await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut new = NewUser::new("someone@example.com", Some(hash));
        new.active = active;
        queries::insert_user(&mut conn, &new).await.unwrap()
    }

    #[tokio::test]
    async fn hash_is_never_the_plaintext() {
        let pool = test_pool().await;
        let svc = test_service(pool);
        let hash = svc.hash_password("123").await.unwrap();
        assert_ne!(hash, "123");
        assert!(svc.verify_password("123", &hash).await.unwrap());
        assert!(!svc.verify_password("1234", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_tracks_logins() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        seeded_user(&svc, &pool, true).await;

        let first = svc
            .authenticate("someone@example.com", "hunter22", Some("192.0.2.1"))
            .await
            .unwrap();
        assert_eq!(first.login_count, 1);
        assert_eq!(first.current_login_ip.as_deref(), Some("192.0.2.1"));

        let second = svc
            .authenticate(" someone@example.com ", "hunter22", Some("192.0.2.2"))
            .await
            .unwrap();
        assert_eq!(second.login_count, 2);
        assert_eq!(second.last_login_ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(second.current_login_ip.as_deref(), Some("192.0.2.2"));
    }

    #[tokio::test]
    async fn authenticate_rejects_bad_credentials() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        seeded_user(&svc, &pool, true).await;

        let wrong = svc.authenticate("someone@example.com", "nope", None).await;
        assert!(matches!(wrong, Err(AppError::Auth(AuthError::InvalidCredentials))));

        let unknown = svc.authenticate("nobody@example.com", "hunter22", None).await;
        assert!(matches!(unknown, Err(AppError::Auth(AuthError::InvalidCredentials))));

        let mut conn = pool.acquire().await.unwrap();
        let user = queries::find_user_by_email(&mut conn, "someone@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.login_count, 0);
    }

    #[tokio::test]
    async fn authenticate_rejects_inactive_accounts() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        seeded_user(&svc, &pool, false).await;

        let result = svc.authenticate("someone@example.com", "hunter22", None).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::Inactive))));
    }

    #[tokio::test]
    async fn authenticate_rejects_accounts_without_password() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        let mut conn = pool.acquire().await.unwrap();
        queries::insert_user(&mut conn, &NewUser::new("nopass", None)).await.unwrap();
        drop(conn);

        let result = svc.authenticate("nopass", "", None).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredentials))));
    }

    #[tokio::test]
    async fn session_round_trip() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        let user = seeded_user(&svc, &pool, true).await;

        let token = svc.issue_session(&user).unwrap();
        let claims = svc.decode_session(&token).unwrap();
        assert_eq!(claims.sub, user.id);

        let principal = svc.load_principal(&claims).await.unwrap().unwrap();
        assert_eq!(principal.user.email, "someone@example.com");
        assert!(principal.roles.is_empty());

        assert!(svc.decode_session("garbage").is_err());
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected() {
        let pool = test_pool().await;
        let svc = test_service(pool);
        let claims = SessionClaims {
            sub: 1,
            email: "someone".into(),
            iat: 0,
            exp: 1,
        };
        let token = encode(&Header::default(), &claims, &svc.encoding_key).unwrap();
        assert!(matches!(svc.decode_session(&token), Err(AuthError::Session(_))));
    }

    #[tokio::test]
    async fn deleted_users_have_no_principal() {
        let pool = test_pool().await;
        let svc = test_service(pool.clone());
        let user = seeded_user(&svc, &pool, true).await;
        let claims = svc.decode_session(&svc.issue_session(&user).unwrap()).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        queries::delete_user(&mut conn, user.id).await.unwrap();
        drop(conn);

        assert!(svc.load_principal(&claims).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cookies() {
        let config = SecurityConfig {
            secure_cookie: true,
            ..SecurityConfig::default()
        };
        let pool = sqlx::SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let svc = AuthService::new(pool, &config).unwrap();
        let cookie = svc.session_cookie("abc");
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86_400)));

        let cleared = svc.clear_session_cookie();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(Duration::ZERO));
        assert!(cleared.to_string().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn insecure_cookie_omits_the_secure_flag() {
        let pool = sqlx::SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let svc = AuthService::new(pool, &SecurityConfig::default()).unwrap();
        let header = svc.session_cookie("abc").to_string();
        assert!(header.starts_with("session=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }

    #[tokio::test]
    async fn authenticate_upgrades_hashes_from_another_scheme() {
        let pool = test_pool().await;
        let bcrypt_svc = test_service(pool.clone());
        let user = seeded_user(&bcrypt_svc, &pool, true).await;
        assert!(user.password.as_deref().unwrap().starts_with("$2"));

        let argon_svc = AuthService::new(pool.clone(), &SecurityConfig::default()).unwrap();
        let logged_in = argon_svc
            .authenticate("someone@example.com", "hunter22", None)
            .await
            .unwrap();
        assert_eq!(logged_in.login_count, 1);

        let mut conn = pool.acquire().await.unwrap();
        let stored = queries::find_user(&mut conn, user.id)
            .await
            .unwrap()
            .unwrap()
            .password
            .unwrap();
        drop(conn);
        assert!(stored.starts_with("$argon2id$"));
        assert!(argon_svc.verify_password("hunter22", &stored).await.unwrap());
        assert!(argon_svc
            .authenticate("someone@example.com", "hunter22", None)
            .await
            .is_ok());
    }
}
