use std::path::PathBuf;

use crate::query::VariantQuery;

/// Retry/backoff knobs applied to every storefront and relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts per request, including the first one. Always `>= 1`.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    /// Upper bound of the random delay added on top of the exponential step.
    pub backoff_jitter_ms: u64,
    /// A `Retry-After` longer than this stops the retry loop instead of sleeping.
    pub max_retry_after_secs: u64,
}

/// Credentials for the Telegram bot used as the notification transport.
#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub product_handle: String,
    pub variant_id: i64,
    pub store_url: String,
    pub region_path: Option<String>,
    pub product_title: Option<String>,
    pub variant_label: Option<String>,
    pub telegram: Option<TelegramSettings>,
    pub state_path: PathBuf,
    pub relay_url_template: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetrySettings,
    pub log_level: String,
}

impl AppConfig {
    /// Builds the immutable query every strategy works from.
    #[must_use]
    pub fn variant_query(&self) -> VariantQuery {
        VariantQuery::new(
            &self.store_url,
            self.region_path.as_deref(),
            &self.product_handle,
            self.variant_id,
        )
    }
}
