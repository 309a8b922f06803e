//! Strategy 2: schema.org JSON-LD embedded in the rendered product page.

use std::sync::Arc;

use futures::future::BoxFuture;
use restock_core::{Probe, StockResult, StockSource, VariantQuery};
use serde_json::Value;

use super::StockStrategy;
use crate::client::StorefrontClient;
use crate::error::ScraperError;
use crate::html::json_ld_blocks;
use crate::signals::classify_availability_token;

pub struct MarkupStrategy {
    client: Arc<StorefrontClient>,
}

impl MarkupStrategy {
    #[must_use]
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError`] if the rendered page cannot be fetched.
    pub async fn check(&self, query: &VariantQuery) -> Result<Probe, ScraperError> {
        let page = self.client.fetch_page(&query.page_url()).await?;
        Ok(match availability_from_json_ld(&page, query.variant_id()) {
            Some(hit) => Probe::Conclusive(StockResult {
                available: hit.available,
                variant_label: hit.variant_label,
                product_title: hit.product_title,
                source: StockSource::StructuredMarkup,
            }),
            None => Probe::Inconclusive,
        })
    }
}

impl StockStrategy for MarkupStrategy {
    fn source(&self) -> StockSource {
        StockSource::StructuredMarkup
    }

    fn probe<'a>(&'a self, query: &'a VariantQuery) -> BoxFuture<'a, Result<Probe, ScraperError>> {
        Box::pin(self.check(query))
    }
}

/// A decisive availability value found in structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupHit {
    pub available: bool,
    pub product_title: Option<String>,
    pub variant_label: Option<String>,
}

#[derive(Debug)]
struct Candidate {
    available: bool,
    mentions_variant: bool,
    label: Option<String>,
}

/// Scans `<script type="application/ld+json">` blocks in document order.
///
/// Within a block, an offer tied to `variant_id` wins over other offers. An
/// offer is tied through its own `url`, `sku`, `@id`, `productID` or `gtin`;
/// only an offer with none of those inherits its ancestor's tie. The first block
/// with any decisive availability value wins. Unparseable blocks are skipped.
#[must_use]
pub fn availability_from_json_ld(html: &str, variant_id: i64) -> Option<MarkupHit> {
    let id = variant_id.to_string();

    for (index, raw) in json_ld_blocks(html).into_iter().enumerate() {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(block = index, error = %e, "skipping unparseable JSON-LD block");
                continue;
            }
        };

        let mut candidates = Vec::new();
        collect_candidates(&value, &id, false, &mut candidates);

        let chosen = candidates
            .iter()
            .find(|c| c.mentions_variant)
            .or_else(|| candidates.first());

        if let Some(c) = chosen {
            return Some(MarkupHit {
                available: c.available,
                product_title: product_name(&value),
                variant_label: c.label.clone(),
            });
        }
    }

    None
}

fn collect_candidates(value: &Value, id: &str, inherited: bool, out: &mut Vec<Candidate>) {
    match value {
        Value::Object(map) => {
            // A node's own identifiers override whatever its parent said.
            let own_ids: Vec<&Value> = ["url", "sku", "@id", "productID", "gtin"]
                .iter()
                .filter_map(|k| map.get(*k))
                .collect();
            let mentions_variant = if own_ids.is_empty() {
                inherited
            } else {
                own_ids.iter().any(|v| value_mentions(v, id))
            };

            if let Some(available) = map
                .get("availability")
                .and_then(Value::as_str)
                .and_then(classify_availability_token)
            {
                out.push(Candidate {
                    available,
                    mentions_variant,
                    label: map.get("name").and_then(Value::as_str).map(str::to_owned),
                });
            }

            for child in map.values() {
                collect_candidates(child, id, mentions_variant, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_candidates(child, id, inherited, out);
            }
        }
        _ => {}
    }
}

fn value_mentions(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => contains_whole_number(s, id),
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

/// `id` occurs in `s` with no digit directly before or after it, so `12`
/// does not match inside `?variant=4312`.
fn contains_whole_number(s: &str, id: &str) -> bool {
    s.match_indices(id).any(|(start, _)| {
        let before = s[..start].chars().next_back();
        let after = s[start + id.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Name of the first `Product`/`ProductGroup` node in the block.
fn product_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            let is_product = match map.get("@type") {
                Some(Value::String(t)) => t.starts_with("Product"),
                Some(Value::Array(ts)) => ts
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|t| t.starts_with("Product")),
                _ => false,
            };
            if is_product {
                if let Some(name) = map.get("name").and_then(Value::as_str) {
                    return Some(name.to_owned());
                }
            }
            map.values().find_map(product_name)
        }
        Value::Array(items) => items.iter().find_map(product_name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(json: &str) -> String {
        format!(r#"<html><head><script type="application/ld+json">{json}</script></head></html>"#)
    }

    #[test]
    fn offer_for_queried_variant_wins() {
        let html = wrap(
            r#"{
              "@context": "http://schema.org/",
              "@type": "Product",
              "name": "Seamless Delight High Neck Bra",
              "offers": [
                {"@type": "Offer", "url": "https://shop.example.com/products/bra?variant=1",
                 "availability": "http://schema.org/InStock"},
                {"@type": "Offer", "url": "https://shop.example.com/products/bra?variant=2",
                 "availability": "http://schema.org/OutOfStock"}
              ]
            }"#,
        );
        let hit = availability_from_json_ld(&html, 2).expect("decisive");
        assert!(!hit.available);
        assert_eq!(
            hit.product_title.as_deref(),
            Some("Seamless Delight High Neck Bra")
        );
    }

    #[test]
    fn offer_with_its_own_url_ignores_parent_variant_reference() {
        let html = wrap(
            r#"{
              "@type": "Product",
              "url": "https://shop.example.com/products/bra?variant=2",
              "offers": [
                {"@type": "Offer", "url": "https://shop.example.com/products/bra?variant=1",
                 "availability": "https://schema.org/InStock"},
                {"@type": "Offer", "url": "https://shop.example.com/products/bra?variant=2",
                 "availability": "https://schema.org/OutOfStock"}
              ]
            }"#,
        );
        let hit = availability_from_json_ld(&html, 2).expect("decisive");
        assert!(!hit.available);
    }

    #[test]
    fn offer_without_identifiers_inherits_parent_variant_reference() {
        let html = wrap(
            r#"{"@graph":[
                {"@type":"Offer","url":"/products/bra?variant=1","availability":"InStock"},
                {"@type":"Product","sku":"2","offers":{"availability":"OutOfStock"}}
            ]}"#,
        );
        let hit = availability_from_json_ld(&html, 2).expect("decisive");
        assert!(!hit.available);
    }

    #[test]
    fn falls_back_to_first_offer_when_variant_not_referenced() {
        let html = wrap(
            r#"{"@type":"Product","offers":{"@type":"Offer","availability":"https://schema.org/InStock"}}"#,
        );
        let hit = availability_from_json_ld(&html, 99).expect("decisive");
        assert!(hit.available);
    }

    #[test]
    fn walks_graph_containers_and_product_groups() {
        let html = wrap(
            r#"{"@graph":[
                {"@type":"Organization","name":"Store"},
                {"@type":"ProductGroup","name":"Bra","hasVariant":[
                    {"@type":"Product","sku":"43774160568500","name":"Bra - L",
                     "offers":{"availability":"OutOfStock"}}
                ]}
            ]}"#,
        );
        let hit = availability_from_json_ld(&html, 43_774_160_568_500).expect("decisive");
        assert!(!hit.available);
        assert_eq!(hit.product_title.as_deref(), Some("Bra"));
    }

    #[test]
    fn skips_broken_blocks_and_uses_later_ones() {
        let html = format!(
            "{}{}",
            wrap("{not json"),
            wrap(r#"{"@type":"Offer","availability":"in stock"}"#)
        );
        let hit = availability_from_json_ld(&html, 1).expect("decisive");
        assert!(hit.available);
    }

    #[test]
    fn first_decisive_block_wins() {
        let html = format!(
            "{}{}{}",
            wrap(r#"{"@type":"BreadcrumbList"}"#),
            wrap(r#"{"@type":"Offer","availability":"Sold Out"}"#),
            wrap(r#"{"@type":"Offer","availability":"InStock"}"#)
        );
        let hit = availability_from_json_ld(&html, 1).expect("decisive");
        assert!(!hit.available);
    }

    #[test]
    fn variant_id_must_match_as_a_whole_number() {
        assert!(contains_whole_number("/products/bra?variant=12", "12"));
        assert!(!contains_whole_number("/products/bra?variant=4312", "12"));
        assert!(!contains_whole_number("/products/bra?variant=123", "12"));
    }

    #[test]
    fn no_availability_anywhere_is_none() {
        let html = wrap(r#"{"@type":"Organization","name":"Store"}"#);
        assert!(availability_from_json_ld(&html, 1).is_none());
        assert!(availability_from_json_ld("<html></html>", 1).is_none());
    }
}
