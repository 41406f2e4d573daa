use crate::app_config::{AppConfig, DbSettings, LlmSettings};
use crate::ConfigError;

const DEFAULT_SUMMARY_TABLE: &str = "bmp_academy_details";
const DEFAULT_REVIEW_ID_COLUMN: &str = "Id";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let review_table = require("REVIEW_TABLE")?;
    let summary_table = or_default("SUMMARY_TABLE", DEFAULT_SUMMARY_TABLE);
    let review_id_column = or_default("REVIEW_ID_COLUMN", DEFAULT_REVIEW_ID_COLUMN);
    let log_level = or_default("REVIEWSUM_LOG_LEVEL", "info");

    let max_concurrency = parse_usize("REVIEWSUM_MAX_CONCURRENCY", "1")?;
    if max_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVIEWSUM_MAX_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let db = DbSettings {
        user: require("MYSQL_USER")?,
        password: require("MYSQL_PASSWORD")?,
        host: require("MYSQL_HOST")?,
        port: parse_u16("MYSQL_PORT", "3306")?,
        database: require("MYSQL_DB")?,
        max_connections: parse_u32("REVIEWSUM_DB_MAX_CONNECTIONS", "5")?,
        min_connections: parse_u32("REVIEWSUM_DB_MIN_CONNECTIONS", "0")?,
        acquire_timeout_secs: parse_u64("REVIEWSUM_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
    };

    if db.min_connections > db.max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVIEWSUM_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({}) exceeds max connections ({})",
                db.min_connections, db.max_connections
            ),
        });
    }

    let llm = LlmSettings {
        api_key: require("OPENAI_API_KEY")?,
        model: or_default("OPENAI_MODEL", DEFAULT_MODEL),
        base_url: or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
        request_timeout_secs: parse_u64("REVIEWSUM_LLM_TIMEOUT_SECS", "60")?,
        max_retries: parse_u32("REVIEWSUM_LLM_MAX_RETRIES", "2")?,
        retry_backoff_base_ms: parse_u64("REVIEWSUM_LLM_RETRY_BACKOFF_BASE_MS", "1000")?,
    };

    Ok(AppConfig {
        review_table,
        review_id_column,
        summary_table,
        log_level,
        max_concurrency,
        db,
        llm,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
