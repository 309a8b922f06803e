//! Fixed-order fallback over the detection strategies.

use restock_core::{Probe, StockResult, StockSource, VariantQuery};

use crate::error::ScraperError;
use crate::strategy::StockStrategy;

/// A strategy that raised instead of answering.
#[derive(Debug)]
pub struct StrategyFailure {
    pub source: StockSource,
    pub error: ScraperError,
}

/// Terminal result of one availability check.
#[derive(Debug)]
pub enum CheckOutcome {
    Conclusive(StockResult),
    /// At least one strategy ran cleanly, none was decisive.
    Inconclusive { failures: Vec<StrategyFailure> },
    /// Every strategy raised.
    Failed { failures: Vec<StrategyFailure> },
}

impl CheckOutcome {
    #[must_use]
    pub fn failures(&self) -> &[StrategyFailure] {
        match self {
            CheckOutcome::Conclusive(_) => &[],
            CheckOutcome::Inconclusive { failures } | CheckOutcome::Failed { failures } => failures,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Conclusive(_) => "conclusive",
            CheckOutcome::Inconclusive { .. } => "inconclusive",
            CheckOutcome::Failed { .. } => "failed",
        }
    }
}

/// Runs `strategies` in order and returns the first conclusive answer.
///
/// A strategy error is logged and the chain continues. Strategies after the
/// first conclusive one are never invoked.
pub async fn check_availability(
    strategies: &[Box<dyn StockStrategy>],
    query: &VariantQuery,
) -> CheckOutcome {
    let mut failures = Vec::new();
    let mut clean_runs = 0_usize;

    for strategy in strategies {
        let source = strategy.source();
        match strategy.probe(query).await {
            Ok(Probe::Conclusive(result)) => {
                tracing::info!(
                    source = %source,
                    available = result.available,
                    "strategy produced a conclusive result"
                );
                return CheckOutcome::Conclusive(result);
            }
            Ok(Probe::Inconclusive) => {
                clean_runs += 1;
                tracing::info!(source = %source, "strategy inconclusive, trying next");
            }
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "strategy failed, trying next");
                failures.push(StrategyFailure { source, error });
            }
        }
    }

    if clean_runs == 0 && !failures.is_empty() {
        CheckOutcome::Failed { failures }
    } else {
        CheckOutcome::Inconclusive { failures }
    }
}
