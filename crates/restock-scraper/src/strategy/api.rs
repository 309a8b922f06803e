//! Strategy 1: the storefront's machine-readable product document.

use std::sync::Arc;

use futures::future::BoxFuture;
use restock_core::{Probe, StockResult, StockSource, VariantQuery};

use super::StockStrategy;
use crate::client::StorefrontClient;
use crate::error::ScraperError;
use crate::types::ProductDocument;

pub struct ApiStrategy {
    client: Arc<StorefrontClient>,
}

impl ApiStrategy {
    #[must_use]
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }

    /// Tries each product document URL in order (region-qualified first).
    ///
    /// A document that loads but lacks the variant is remembered and the next
    /// URL is tried; if no URL yields the variant the result is
    /// [`Probe::Inconclusive`]. Only when every URL failed to load is the last
    /// error returned.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] when no document could be loaded. A 404 is
    /// reported only when every path answered 404.
    pub async fn check(&self, query: &VariantQuery) -> Result<Probe, ScraperError> {
        let mut last_err = None;
        let mut saw_document = false;

        for url in query.product_document_urls() {
            match self.client.fetch_product_document(&url).await {
                Ok(doc) => {
                    saw_document = true;
                    let probe = probe_document(&doc, query.variant_id());
                    if probe.is_conclusive() {
                        return Ok(probe);
                    }
                    tracing::info!(
                        url,
                        variant_id = query.variant_id(),
                        "product document has no usable record for variant"
                    );
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "product document fetch failed");
                    // A 404 on one path says less than a block or outage on the other.
                    if last_err
                        .as_ref()
                        .is_none_or(|prev| matches!(prev, ScraperError::NotFound { .. }))
                    {
                        last_err = Some(e);
                    }
                }
            }
        }

        match last_err {
            Some(e) if !saw_document => Err(e),
            _ => Ok(Probe::Inconclusive),
        }
    }
}

impl StockStrategy for ApiStrategy {
    fn source(&self) -> StockSource {
        StockSource::Api
    }

    fn probe<'a>(&'a self, query: &'a VariantQuery) -> BoxFuture<'a, Result<Probe, ScraperError>> {
        Box::pin(self.check(query))
    }
}

/// Maps the variant's `available` flag straight to a result.
///
/// Variant missing, or present without an `available` field, is
/// [`Probe::Inconclusive`]: catalogs change and the id may have been retired.
#[must_use]
pub fn probe_document(doc: &ProductDocument, variant_id: i64) -> Probe {
    let Some(variant) = doc.variant(variant_id) else {
        return Probe::Inconclusive;
    };
    let Some(available) = variant.available else {
        return Probe::Inconclusive;
    };
    Probe::Conclusive(StockResult {
        available,
        variant_label: variant.title.clone(),
        product_title: doc.title.clone(),
        source: StockSource::Api,
    })
}
