/// Configuration management for the API server
///
/// Configuration is layered, later layers winning:
///
/// 1. Built-in defaults
/// 2. `TASKDESK__<SECTION>__<KEY>` environment variables
///    (e.g. `TASKDESK__API__PORT=3000`, `TASKDESK__LOG__JSON=true`)
/// 3. The conventional `DATABASE_URL`, `JWT_SECRET` and `PORT` variables
///
/// A `.env` file in the working directory is loaded first, if present.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::jwt::DEFAULT_SESSION_TTL_HOURS;
use taskdesk_shared::db::pool;

/// Prefix of structured environment variables
const ENV_PREFIX: &str = "TASKDESK";

/// Minimum accepted length of the token signing secret
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Longest accepted session lifetime (10 years)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Logging configuration
    pub log: LogConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Enables production-only hardening (HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Idle connections kept open
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_seconds: u64,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret
    ///
    /// Must be at least 32 characters. Generate with `openssl rand -hex 32`.
    pub secret: String,

    /// Lifetime of a session token
    pub session_ttl_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Loads configuration from the process environment (and `.env`)
    ///
    /// # Errors
    ///
    /// Returns an error if required values are missing or any value fails to
    /// parse or validate.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars().collect())
    }

    /// Loads configuration from an explicit set of environment variables
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let database_url = vars.get("DATABASE_URL").cloned();
        let jwt_secret = vars.get("JWT_SECRET").cloned();
        let port = vars.get("PORT").cloned();

        let db_defaults = pool::DatabaseConfig::default();

        let config: Config = config::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 3000)?
            .set_default("api.cors_origins", vec!["*"])?
            .set_default("api.production", false)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", db_defaults.max_connections)?
            .set_default("database.min_connections", db_defaults.min_connections)?
            .set_default(
                "database.acquire_timeout_seconds",
                db_defaults.acquire_timeout_seconds,
            )?
            .set_default("jwt.secret", "")?
            .set_default("jwt.session_ttl_hours", DEFAULT_SESSION_TTL_HOURS)?
            .set_default("log.json", false)?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .source(Some(vars)),
            )
            .set_override_option("database.url", database_url)?
            .set_override_option("jwt.secret", jwt_secret)?
            .set_override_option("api.port", port)?
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that the type system can't
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        if self.jwt.secret.is_empty() {
            anyhow::bail!("JWT_SECRET environment variable is required");
        }

        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        if self.jwt.session_ttl_hours <= 0 {
            anyhow::bail!("jwt.session_ttl_hours must be positive");
        }

        if self.jwt.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            anyhow::bail!(
                "jwt.session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            );
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session token lifetime, clamped to the accepted range
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            acquire_timeout_seconds: self.database.acquire_timeout_seconds,
            ..Default::default()
        }
    }
}
