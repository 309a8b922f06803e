pub mod client;
pub mod error;
pub(crate) mod html;
pub mod orchestrator;
pub mod retry;
pub mod signals;
pub mod strategy;
pub mod types;

pub use client::StorefrontClient;
pub use error::ScraperError;
pub use orchestrator::{check_availability, CheckOutcome, StrategyFailure};
pub use retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use strategy::{default_chain, StockStrategy};
pub use types::{DocumentVariant, ProductDocument};
