pub mod app_config;
pub mod config;
pub mod query;
pub mod stock;

pub use app_config::{AppConfig, RetrySettings, TelegramSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use query::VariantQuery;
pub use stock::{Probe, StockResult, StockSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
