//! Strategy 4: plain-text rendering of the page through a third-party relay.
//!
//! Used last, when the storefront blocks direct requests. Only the
//! page-text rules apply; the relay strips markup.

use std::sync::Arc;

use futures::future::BoxFuture;
use restock_core::{Probe, StockResult, StockSource, VariantQuery};

use super::StockStrategy;
use crate::client::StorefrontClient;
use crate::error::ScraperError;
use crate::html::collapse;
use crate::signals::{scan_text, PAGE_TEXT_RULES};

pub struct ProxyStrategy {
    client: Arc<StorefrontClient>,
}

impl ProxyStrategy {
    #[must_use]
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError`] if the relay request fails.
    pub async fn check(&self, query: &VariantQuery) -> Result<Probe, ScraperError> {
        let text = self.client.fetch_relay_text(&query.page_url()).await?;
        Ok(probe_relay_text(&text))
    }
}

impl StockStrategy for ProxyStrategy {
    fn source(&self) -> StockSource {
        StockSource::Proxy
    }

    fn probe<'a>(&'a self, query: &'a VariantQuery) -> BoxFuture<'a, Result<Probe, ScraperError>> {
        Box::pin(self.check(query))
    }
}

/// Negative phrases, then positive phrases, over the collapsed lowercased text.
#[must_use]
pub fn probe_relay_text(text: &str) -> Probe {
    let normalized = collapse(text).to_lowercase();
    match scan_text(&normalized, PAGE_TEXT_RULES) {
        Some(rule) => {
            tracing::debug!(phrase = rule.phrase, "relay text matched");
            Probe::Conclusive(StockResult::new(rule.available, StockSource::Proxy))
        }
        None => Probe::Inconclusive,
    }
}
