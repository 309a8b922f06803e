use std::path::PathBuf;

use crate::app_config::{AppConfig, RetrySettings, TelegramSettings};
use crate::ConfigError;

const DEFAULT_STORE_URL: &str = "https://www.aloyoga.com";
const DEFAULT_REGION_PATH: &str = "ko-kr";
const DEFAULT_STATE_PATH: &str = ".restock_state.json";
const DEFAULT_RELAY_URL_TEMPLATE: &str = "https://r.jina.ai/{url}";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Placeholder the relay template must contain; replaced by the page URL.
pub const RELAY_URL_PLACEHOLDER: &str = "{url}";

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
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let url = reqwest::Url::parse(&raw).map_err(|e| invalid(var, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(var, format!("unsupported scheme \"{}\"", url.scheme())));
        }
        Ok(raw.trim_end_matches('/').to_string())
    };

    let product_handle = require("PRODUCT_HANDLE")?;
    let variant_id = require("VARIANT_ID")?
        .parse::<i64>()
        .map_err(|e| invalid("VARIANT_ID", e.to_string()))?;

    let store_url = parse_url("RESTOCK_STORE_URL", DEFAULT_STORE_URL)?;
    // An explicitly empty region means "unqualified paths only".
    let region_path = match lookup("RESTOCK_REGION_PATH") {
        Ok(v) => Some(v.trim().trim_matches('/').to_string()).filter(|v| !v.is_empty()),
        Err(_) => Some(DEFAULT_REGION_PATH.to_string()),
    };

    let telegram = match (optional("TELEGRAM_BOT_TOKEN"), optional("TELEGRAM_CHAT_ID")) {
        (Some(bot_token), Some(chat_id)) => Some(TelegramSettings {
            bot_token,
            chat_id,
            api_url: parse_url("RESTOCK_TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL)?,
        }),
        _ => None,
    };

    let relay_url_template = or_default("RESTOCK_RELAY_URL_TEMPLATE", DEFAULT_RELAY_URL_TEMPLATE);
    if !relay_url_template.contains(RELAY_URL_PLACEHOLDER) {
        return Err(invalid(
            "RESTOCK_RELAY_URL_TEMPLATE",
            format!("template must contain {RELAY_URL_PLACEHOLDER}"),
        ));
    }

    let max_attempts = parse_u32("RESTOCK_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid("RESTOCK_MAX_ATTEMPTS", "must be at least 1".to_string()));
    }

    Ok(AppConfig {
        product_handle,
        variant_id,
        store_url,
        region_path,
        product_title: optional("PRODUCT_TITLE"),
        variant_label: optional("VARIANT_LABEL"),
        telegram,
        state_path: PathBuf::from(or_default("RESTOCK_STATE_PATH", DEFAULT_STATE_PATH)),
        relay_url_template,
        request_timeout_secs: parse_u64("RESTOCK_REQUEST_TIMEOUT_SECS", "15")?,
        user_agent: or_default("RESTOCK_USER_AGENT", DEFAULT_USER_AGENT),
        retry: RetrySettings {
            max_attempts,
            backoff_base_ms: parse_u64("RESTOCK_BACKOFF_BASE_MS", "1000")?,
            backoff_jitter_ms: parse_u64("RESTOCK_BACKOFF_JITTER_MS", "500")?,
            max_retry_after_secs: parse_u64("RESTOCK_MAX_RETRY_AFTER_SECS", "30")?,
        },
        log_level: or_default("RESTOCK_LOG_LEVEL", "info"),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
