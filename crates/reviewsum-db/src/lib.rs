use std::time::Duration;

use reviewsum_core::{AppConfig, DbSettings};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use thiserror::Error;

pub mod repository;
pub mod reviews;

pub use repository::ReviewRepository;
pub use reviews::{fetch_ratings_and_reviews, list_distinct_ids, write_summary, ReviewRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::from_settings(&config.db)
    }

    #[must_use]
    pub fn from_settings(settings: &DbSettings) -> Self {
        Self {
            max_connections: settings.max_connections,
            min_connections: settings.min_connections,
            acquire_timeout_secs: settings.acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// The store could not be reached: I/O, TLS, or pool exhaustion.
    #[error("database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// The store answered but the statement failed.
    #[error("database query error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            other => Self::Query(other),
        }
    }
}

impl DbError {
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

fn connect_options(settings: &DbSettings) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.database)
}

fn pool_options(config: PoolConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

/// Build a pool that opens its first connection on first use.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn connect_pool_lazy(settings: &DbSettings, config: PoolConfig) -> MySqlPool {
    pool_options(config).connect_lazy_with(connect_options(settings))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &MySqlPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

/// Validate a table or column name and return it backtick-quoted.
///
/// Names are spliced into SQL text, so only plain identifiers are accepted:
/// ASCII letters, digits and underscores, not starting with a digit, at most
/// 64 characters.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] for anything else.
pub fn quote_identifier(name: &str) -> Result<String, DbError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= 64 {
        Ok(format!("`{name}`"))
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn quote_identifier_accepts_plain_names() {
        assert_eq!(quote_identifier("Id").unwrap(), "`Id`");
        assert_eq!(
            quote_identifier("bmp_academy_details").unwrap(),
            "`bmp_academy_details`"
        );
        assert_eq!(quote_identifier("_t2").unwrap(), "`_t2`");
    }

    #[test]
    fn quote_identifier_rejects_injection_and_odd_names() {
        for bad in [
            "",
            "1table",
            "reviews; DROP TABLE reviews",
            "re`views",
            "reviews.Id",
            "naïve",
        ] {
            assert!(
                matches!(quote_identifier(bad), Err(DbError::InvalidIdentifier(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn quote_identifier_rejects_overlong_names() {
        let long = "a".repeat(65);
        assert!(quote_identifier(&long).is_err());
        assert!(quote_identifier(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn sqlx_errors_are_classified() {
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_connection());
        assert!(DbError::from(sqlx::Error::PoolClosed).is_connection());
        assert!(!DbError::from(sqlx::Error::RowNotFound).is_connection());
    }
}
