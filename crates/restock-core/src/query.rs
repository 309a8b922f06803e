//! The immutable per-run query and the storefront URLs derived from it.

/// Identifies one purchasable variant on one storefront.
///
/// All URL derivation lives here so the strategies, the notifier link, and the
/// tests agree on a single layout:
///
/// - product document: `{origin}/{region?}/products/{handle}.js`
/// - rendered page:    `{origin}/{region?}/products/{handle}?variant={id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantQuery {
    origin: String,
    region: Option<String>,
    handle: String,
    variant_id: i64,
}

impl VariantQuery {
    /// Empty or slash-only `region` values are treated as "no region".
    #[must_use]
    pub fn new(store_url: &str, region: Option<&str>, handle: &str, variant_id: i64) -> Self {
        let region = region
            .map(|r| r.trim_matches('/').to_owned())
            .filter(|r| !r.is_empty());
        Self {
            origin: store_url.trim_end_matches('/').to_owned(),
            region,
            handle: handle.trim_matches('/').to_owned(),
            variant_id,
        }
    }

    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    #[must_use]
    pub fn variant_id(&self) -> i64 {
        self.variant_id
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Product document URLs in the order they should be tried:
    /// region-qualified first (when a region is set), then unqualified.
    #[must_use]
    pub fn product_document_urls(&self) -> Vec<String> {
        let unqualified = format!("{}/products/{}.js", self.origin, self.handle);
        match &self.region {
            Some(region) => vec![
                format!("{}/{region}/products/{}.js", self.origin, self.handle),
                unqualified,
            ],
            None => vec![unqualified],
        }
    }

    /// Rendered product page with the variant preselected. Also used as the
    /// canonical link in notifications.
    #[must_use]
    pub fn page_url(&self) -> String {
        format!(
            "{}{}/products/{}?variant={}",
            self.origin,
            self.region_prefix(),
            self.handle,
            self.variant_id
        )
    }

    fn region_prefix(&self) -> String {
        self.region
            .as_ref()
            .map(|r| format!("/{r}"))
            .unwrap_or_default()
    }
}
