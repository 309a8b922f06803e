//! Response types for the storefront's public `/products/{handle}.js` endpoint.
//!
//! ## Observed shape
//!
//! The `.js` document is the theme-facing product JSON. Unlike the admin-style
//! `products.json`, prices are integers in minor units and variant records
//! carry a boolean `available`. Only the fields the stock check needs are
//! modeled; everything else is ignored by serde.
//!
//! ### `id` on variants
//! Always a JSON number in observed responses. Some proxies and older themes
//! re-serialize it as a string, so both forms are accepted.
//!
//! ### `available` on variants
//! Boolean. Absence is treated as "no signal" rather than defaulted, since an
//! optimistic default would report a restock that never happened.

use serde::{Deserialize, Deserializer};

/// Top-level response from `GET /products/{handle}.js`.
#[derive(Debug, Deserialize)]
pub struct ProductDocument {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub variants: Vec<DocumentVariant>,
}

/// A single purchasable variant inside a [`ProductDocument`].
#[derive(Debug, Deserialize)]
pub struct DocumentVariant {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: i64,

    /// Display title, e.g. `"White Heather / L"`.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub available: Option<bool>,
}

impl ProductDocument {
    #[must_use]
    pub fn variant(&self, variant_id: i64) -> Option<&DocumentVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
