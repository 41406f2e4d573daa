pub mod app_config;
pub mod config;
pub mod preprocess;
pub mod review;

pub use app_config::{AppConfig, DbSettings, LlmSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use preprocess::clean;
pub use review::{BatchError, EntityId, ReviewBatch, ReviewRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
