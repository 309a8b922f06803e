//! Notification transports.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use restock_core::TelegramSettings;
use serde::Serialize;

use crate::error::NotifyError;
use crate::message::truncate_chars;

/// Delivers one plain-text message.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &TelegramSettings, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                settings.api_url.trim_end_matches('/'),
                settings.bot_token
            ),
            chat_id: settings.chat_id.clone(),
        })
    }

    async fn post(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                disable_web_page_preview: true,
            })
            .send()
            .await
            // The endpoint path carries the bot token.
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_owned());
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: truncate_chars(&body, 200),
        })
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.post(text))
    }
}

/// Writes messages to the log. Used when no Telegram credentials are set.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        tracing::warn!(message = text, "notification (no transport configured)");
        Box::pin(async { Ok(()) })
    }
}

/// Telegram when credentials are configured, otherwise [`LogNotifier`].
///
/// # Errors
///
/// Returns [`NotifyError::Http`] if the Telegram HTTP client cannot be built.
pub fn notifier_from_settings(
    telegram: Option<&TelegramSettings>,
    timeout_secs: u64,
) -> Result<Box<dyn Notifier>, NotifyError> {
    match telegram {
        Some(settings) => Ok(Box::new(TelegramNotifier::new(settings, timeout_secs)?)),
        None => {
            tracing::info!(
                "TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set; notifications go to the log"
            );
            Ok(Box::new(LogNotifier))
        }
    }
}
