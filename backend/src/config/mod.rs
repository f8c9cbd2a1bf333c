//! Central module for application-wide configuration settings.
//!
//! Settings are layered: built-in development defaults, then an optional TOML
//! file, then `WARDEN_*` environment variables. Everything the process needs
//! (listen address, database URL, session secret, password hashing scheme and
//! salt, mail transport, seed credentials) lives here and is handed to the
//! components that need it at startup.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use warden_security::PasswordScheme;

/// Session secret shipped with the development defaults.
pub const DEV_SECRET_KEY: &str = "warden-dev-secret-change-me";

const ENV_PREFIX: &str = "WARDEN_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("[{field}]: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: &str) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7000,
            debug: false,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://warden.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Signs session tokens.
    pub secret_key: String,
    pub password_hash: PasswordScheme,
    /// Keys every password before it is hashed.
    pub password_salt: String,
    pub session_ttl_secs: u64,
    pub session_cookie: String,
    pub secure_cookie: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET_KEY.to_string(),
            password_hash: PasswordScheme::default(),
            password_salt: "warden-dev-salt-change-me".to_string(),
            session_ttl_secs: 86_400,
            session_cookie: "session".to_string(),
            secure_cookie: false,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"<redacted>")
            .field("password_hash", &self.password_hash)
            .field("password_salt", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_cookie", &self.session_cookie)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Outbound mail transport settings. Mail delivery itself is handled outside
/// this service; the values are validated and carried for it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 25,
            use_tls: false,
            use_ssl: false,
            username: None,
            password: None,
            default_sender: None,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("default_sender", &self.default_sender)
            .finish()
    }
}

/// Initial passwords of the two accounts created by the seeding routine.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub end_user_password: String,
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            end_user_password: "change-me-end-user".to_string(),
            admin_password: "change-me-admin".to_string(),
        }
    }
}

impl fmt::Debug for SeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedConfig").finish_non_exhaustive()
    }
}

impl Config {
    /// Load defaults, the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `WARDEN_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = var("DEBUG") {
            self.server.debug = parse_bool("DEBUG", &v)?;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = var("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Some(v) = var("PASSWORD_HASH") {
            self.security.password_hash = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: format!("{ENV_PREFIX}PASSWORD_HASH"),
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("PASSWORD_SALT") {
            self.security.password_salt = v;
        }
        if let Some(v) = var("SESSION_TTL_SECS") {
            self.security.session_ttl_secs = parse_env("SESSION_TTL_SECS", &v)?;
        }
        if let Some(v) = var("SECURE_COOKIE") {
            self.security.secure_cookie = parse_bool("SECURE_COOKIE", &v)?;
        }
        if let Some(v) = var("MAIL_SERVER") {
            self.mail.server = v;
        }
        if let Some(v) = var("MAIL_PORT") {
            self.mail.port = parse_env("MAIL_PORT", &v)?;
        }
        if let Some(v) = var("MAIL_USE_TLS") {
            self.mail.use_tls = parse_bool("MAIL_USE_TLS", &v)?;
        }
        if let Some(v) = var("MAIL_USE_SSL") {
            self.mail.use_ssl = parse_bool("MAIL_USE_SSL", &v)?;
        }
        if let Some(v) = var("MAIL_USERNAME") {
            self.mail.username = Some(v);
        }
        if let Some(v) = var("MAIL_PASSWORD") {
            self.mail.password = Some(v);
        }
        if let Some(v) = var("MAIL_DEFAULT_SENDER") {
            self.mail.default_sender = Some(v);
        }
        if let Some(v) = var("SEED_END_USER_PASSWORD") {
            self.seed.end_user_password = v;
        }
        if let Some(v) = var("SEED_ADMIN_PASSWORD") {
            self.seed.admin_password = v;
        }
        Ok(())
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::invalid("database.url", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid("database.max_connections", "must be at least 1"));
        }
        if self.security.secret_key.is_empty() {
            return Err(ConfigError::invalid("security.secret_key", "must not be empty"));
        }
        if self.security.password_salt.is_empty() {
            return Err(ConfigError::invalid("security.password_salt", "must not be empty"));
        }
        if self.security.session_ttl_secs == 0 {
            return Err(ConfigError::invalid("security.session_ttl_secs", "must be non-zero"));
        }
        if self.security.session_cookie.is_empty() {
            return Err(ConfigError::invalid("security.session_cookie", "must not be empty"));
        }
        if !self.mail.server.is_empty() && self.mail.port == 0 {
            return Err(ConfigError::invalid("mail.port", "must be non-zero when a server is set"));
        }
        if self.mail.use_tls && self.mail.use_ssl {
            return Err(ConfigError::invalid("mail", "use_tls and use_ssl are mutually exclusive"));
        }
        if self.seed.end_user_password.is_empty() {
            return Err(ConfigError::invalid("seed.end_user_password", "must not be empty"));
        }
        if self.seed.admin_password.is_empty() {
            return Err(ConfigError::invalid("seed.admin_password", "must not be empty"));
        }
        Ok(())
    }

    /// Log configuration smells that are legal but should be fixed.
    pub fn warn_on_weak_settings(&self) {
        if !self.server.debug && self.security.secret_key == DEV_SECRET_KEY {
            tracing::warn!("security.secret_key is the development default; set WARDEN_SECRET_KEY");
        }
        if self.seed.end_user_password == self.seed.admin_password {
            tracing::warn!(
                "both seed accounts share one password; configure distinct seed passwords"
            );
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_string(),
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: format!("{ENV_PREFIX}{name}"),
            value: value.to_string(),
        }),
    }
}
