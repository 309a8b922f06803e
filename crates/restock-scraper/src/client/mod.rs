//! HTTP client for the storefront's product document, rendered product page,
//! and the third-party text relay.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use restock_core::config::RELAY_URL_PLACEHOLDER;
use tokio::sync::Mutex;

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
use crate::types::ProductDocument;

const ACCEPT_JSON: &str = "application/json,text/javascript;q=0.9,*/*;q=0.8";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_TEXT: &str = "text/plain,text/markdown;q=0.9,*/*;q=0.8";

/// HTTP client shared by every strategy in one run.
///
/// Every request goes through [`retry_with_backoff`] with the same
/// [`RetryPolicy`]. Non-2xx responses become typed errors: 429/403 as
/// [`ScraperError::RateLimited`], 404 as [`ScraperError::NotFound`], anything
/// else as [`ScraperError::UnexpectedStatus`].
///
/// The rendered page body is memoised per URL for the lifetime of the client,
/// so the structured-markup and heuristic strategies inspect the same page
/// with one fetch. Failed fetches are not cached.
pub struct StorefrontClient {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    relay_url_template: String,
    page_cache: Mutex<Option<(String, Arc<str>)>>,
}

impl StorefrontClient {
    /// Creates a client with the configured timeout, `User-Agent`, retry policy
    /// and relay template.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be built.
    /// - [`ScraperError::InvalidUrl`] if `relay_url_template` lacks the `{url}`
    ///   placeholder.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
        relay_url_template: &str,
    ) -> Result<Self, ScraperError> {
        if !relay_url_template.contains(RELAY_URL_PLACEHOLDER) {
            return Err(ScraperError::InvalidUrl {
                url: relay_url_template.to_owned(),
                reason: format!("relay template must contain {RELAY_URL_PLACEHOLDER}"),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            policy,
            sleeper: Arc::new(TokioSleeper),
            relay_url_template: relay_url_template.to_owned(),
            page_cache: Mutex::new(None),
        })
    }

    /// Replaces the back-off sleeper (tests use a recording or no-op sleeper).
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fetches and parses a `/products/{handle}.js` document.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RetryExhausted`] when 429/403/5xx or network errors
    ///   persist through every attempt.
    /// - [`ScraperError::NotFound`] on 404 (not retried).
    /// - [`ScraperError::Deserialize`] if the body is not a product document.
    pub async fn fetch_product_document(&self, url: &str) -> Result<ProductDocument, ScraperError> {
        let body = self.get_text(url, ACCEPT_JSON).await?;
        serde_json::from_str::<ProductDocument>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("product document from {url}"),
            source: e,
        })
    }

    /// Fetches the rendered product page, reusing a previous successful fetch
    /// of the same URL.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontClient::fetch_product_document`] minus
    /// deserialization.
    pub async fn fetch_page(&self, url: &str) -> Result<Arc<str>, ScraperError> {
        let mut cache = self.page_cache.lock().await;
        if let Some((cached_url, body)) = cache.as_ref() {
            if cached_url == url {
                tracing::debug!(url, "reusing rendered page from this run");
                return Ok(Arc::clone(body));
            }
        }
        let body: Arc<str> = self.get_text(url, ACCEPT_HTML).await?.into();
        *cache = Some((url.to_owned(), Arc::clone(&body)));
        Ok(body)
    }

    /// Fetches `target_url` through the text relay.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontClient::fetch_page`].
    pub async fn fetch_relay_text(&self, target_url: &str) -> Result<String, ScraperError> {
        let url = self.relay_url(target_url);
        self.get_text(&url, ACCEPT_TEXT).await
    }

    fn relay_url(&self, target_url: &str) -> String {
        self.relay_url_template.replace(RELAY_URL_PLACEHOLDER, target_url)
    }

    async fn get_text(&self, url: &str, accept: &'static str) -> Result<String, ScraperError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        retry_with_backoff(&self.policy, self.sleeper.as_ref(), || {
            let parsed = parsed.clone();
            async move {
                let response = self
                    .client
                    .get(parsed.clone())
                    .header(reqwest::header::ACCEPT, accept)
                    .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
                    .header(reqwest::header::CACHE_CONTROL, "no-cache")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    return Err(ScraperError::RateLimited {
                        status: status.as_u16(),
                        url: parsed.to_string(),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: parsed.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: parsed.to_string(),
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
