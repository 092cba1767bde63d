//! Database configuration.

use std::env;
use std::time::Duration;

use super::errors::{StoreError, StoreResult};

/// Pool configuration for the Postgres-backed stores.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a query waits for a free connection before failing
    pub acquire_timeout: Duration,
    /// Idle connections are dropped after this
    pub idle_timeout: Duration,
    /// Connections are recycled after this
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    /// A configuration for `url` with default pool sizing.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 16,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `DATABASE_URL` is required. Pool sizing can be overridden through
    /// `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS`,
    /// `DB_IDLE_TIMEOUT_SECS` and `DB_MAX_LIFETIME_SECS`.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let url = get("DATABASE_URL")
            .ok_or_else(|| StoreError::Config("DATABASE_URL is not set".to_string()))?;
        let mut config = Self::new(url);

        if let Some(value) = get("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_count("DB_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = get("DB_MIN_CONNECTIONS") {
            config.min_connections = parse_count("DB_MIN_CONNECTIONS", &value)?;
        }
        if let Some(value) = get("DB_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout = parse_secs("DB_ACQUIRE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("DB_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = parse_secs("DB_IDLE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("DB_MAX_LIFETIME_SECS") {
            config.max_lifetime = parse_secs("DB_MAX_LIFETIME_SECS", &value)?;
        }

        if config.min_connections > config.max_connections {
            return Err(StoreError::Config(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            )));
        }
        Ok(config)
    }
}

fn parse_count(key: &str, value: &str) -> StoreResult<u32> {
    value
        .parse()
        .map_err(|_| StoreError::Config(format!("{key} must be an integer, got {value:?}")))
}

fn parse_secs(key: &str, value: &str) -> StoreResult<Duration> {
    let secs: u64 = value
        .parse()
        .map_err(|_| StoreError::Config(format!("{key} must be whole seconds, got {value:?}")))?;
    Ok(Duration::from_secs(secs))
}
