//! Strategy 3: text and control heuristics on the rendered product page.

use std::sync::Arc;

use futures::future::BoxFuture;
use restock_core::{Probe, StockResult, StockSource, VariantQuery};

use super::StockStrategy;
use crate::client::StorefrontClient;
use crate::error::ScraperError;
use crate::html::{controls, find_link_itemprop, find_meta_content, visible_text, Control};
use crate::signals::{
    classify_availability_token, scan_text, PAGE_TEXT_RULES, PURCHASE_LABELS, SOLD_OUT_LABELS,
};

/// Attribute fragments that mark a purchase control regardless of its label.
const PURCHASE_MARKERS: &[&str] = &[
    "add-to-cart",
    "addtocart",
    "add-to-bag",
    "addtobag",
    "product-form__submit",
    "product-form__cart-submit",
];

/// Which rule decided the heuristic outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicSignal {
    MetaTag,
    PurchaseControl,
    PageText(&'static str),
}

pub struct HeuristicStrategy {
    client: Arc<StorefrontClient>,
}

impl HeuristicStrategy {
    #[must_use]
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError`] if the rendered page cannot be fetched.
    pub async fn check(&self, query: &VariantQuery) -> Result<Probe, ScraperError> {
        let page = self.client.fetch_page(&query.page_url()).await?;
        let Some((available, signal)) = heuristic_signal(&page) else {
            return Ok(Probe::Inconclusive);
        };
        tracing::debug!(?signal, available, "heuristic signal decided");
        Ok(Probe::Conclusive(StockResult {
            available,
            variant_label: None,
            product_title: find_meta_content(&page, "og:title"),
            source: StockSource::HeuristicText,
        }))
    }
}

impl StockStrategy for HeuristicStrategy {
    fn source(&self) -> StockSource {
        StockSource::HeuristicText
    }

    fn probe<'a>(&'a self, query: &'a VariantQuery) -> BoxFuture<'a, Result<Probe, ScraperError>> {
        Box::pin(self.check(query))
    }
}

/// Applies the page rules in order; the first decisive one wins:
///
/// 1. availability metadata (`product:availability`, `og:availability`,
///    microdata `itemprop="availability"`);
/// 2. the first purchase control: sold-out wording forces `false`, a disabled
///    control is `false`, an enabled one is `true`;
/// 3. whole-page negative phrases, then positive phrases.
#[must_use]
pub fn heuristic_signal(html: &str) -> Option<(bool, HeuristicSignal)> {
    if let Some(available) = meta_availability(html) {
        return Some((available, HeuristicSignal::MetaTag));
    }

    if let Some(control) = controls(html).into_iter().find(is_purchase_control) {
        let sold_out_label = SOLD_OUT_LABELS.iter().any(|l| control.label.contains(l));
        let available = !sold_out_label && !control.is_disabled();
        return Some((available, HeuristicSignal::PurchaseControl));
    }

    scan_text(&visible_text(html), PAGE_TEXT_RULES)
        .map(|rule| (rule.available, HeuristicSignal::PageText(rule.phrase)))
}

fn meta_availability(html: &str) -> Option<bool> {
    ["product:availability", "og:availability", "availability"]
        .iter()
        .filter_map(|key| find_meta_content(html, key))
        .chain(find_link_itemprop(html, "availability"))
        .find_map(|raw| classify_availability_token(&raw))
}

fn is_purchase_control(control: &Control) -> bool {
    if PURCHASE_LABELS.iter().any(|l| control.label.contains(l)) {
        return true;
    }
    if control
        .attr("name")
        .is_some_and(|n| n.eq_ignore_ascii_case("add"))
    {
        return true;
    }
    let markers = [control.attr("id"), control.attr("class")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    PURCHASE_MARKERS.iter().any(|m| markers.contains(m))
}
