//! Independent availability detection strategies.
//!
//! Each strategy answers from one data source and reports one of:
//! a conclusive [`StockResult`](restock_core::StockResult), [`Probe::Inconclusive`],
//! or a [`ScraperError`]. They never call each other; ordering and fallback
//! live in [`crate::orchestrator`].

mod api;
mod heuristic;
mod markup;
mod proxy;

use std::sync::Arc;

use futures::future::BoxFuture;
use restock_core::{Probe, StockSource, VariantQuery};

use crate::client::StorefrontClient;
use crate::error::ScraperError;

pub use api::{probe_document, ApiStrategy};
pub use heuristic::{heuristic_signal, HeuristicSignal, HeuristicStrategy};
pub use markup::{availability_from_json_ld, MarkupHit, MarkupStrategy};
pub use proxy::{probe_relay_text, ProxyStrategy};

/// One availability data source.
pub trait StockStrategy: Send + Sync {
    fn source(&self) -> StockSource;

    fn probe<'a>(&'a self, query: &'a VariantQuery) -> BoxFuture<'a, Result<Probe, ScraperError>>;
}

/// The fixed priority chain: product API, structured markup, page heuristics,
/// text relay.
#[must_use]
pub fn default_chain(client: &Arc<StorefrontClient>) -> Vec<Box<dyn StockStrategy>> {
    vec![
        Box::new(ApiStrategy::new(Arc::clone(client))),
        Box::new(MarkupStrategy::new(Arc::clone(client))),
        Box::new(HeuristicStrategy::new(Arc::clone(client))),
        Box::new(ProxyStrategy::new(Arc::clone(client))),
    ]
}
