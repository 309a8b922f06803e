//! One scheduled invocation: check, notify on change, persist.
//!
//! ```text
//! START -> CHECKING -> CONCLUSIVE   notify if changed, then persist
//!                   -> INCONCLUSIVE ambiguous-state warning, no write
//!                   -> FAILED       failure warning, no write
//! ```
//!
//! Nothing here returns an error: transport and state-write failures are
//! logged and reflected in the [`RunReport`].

use chrono::{DateTime, Utc};
use restock_core::{AppConfig, StockResult, VariantQuery};
use restock_scraper::{check_availability, CheckOutcome, StockStrategy};

use crate::message::{self, Fallbacks, Subject};
use crate::notify::Notifier;
use crate::state::{PersistedState, StateStore};

/// What one run observed and did.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: CheckOutcome,
    /// Availability recorded before this run, if any.
    pub previous: Option<PersistedState>,
    /// A message (stock change or warning) was delivered.
    pub notified: bool,
    /// The state file was rewritten.
    pub persisted: bool,
}

impl RunReport {
    /// The newly determined availability, when the check was conclusive.
    #[must_use]
    pub fn available(&self) -> Option<bool> {
        match &self.outcome {
            CheckOutcome::Conclusive(result) => Some(result.available),
            _ => None,
        }
    }

    /// Conclusive and different from (or with no) previous record.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.available()
            .is_some_and(|now| self.previous.is_none_or(|prev| prev.available != now))
    }
}

pub struct RunController {
    query: VariantQuery,
    fallbacks: Fallbacks,
    strategies: Vec<Box<dyn StockStrategy>>,
    notifier: Box<dyn Notifier>,
    store: StateStore,
    dry_run: bool,
}

impl RunController {
    #[must_use]
    pub fn new(
        config: &AppConfig,
        strategies: Vec<Box<dyn StockStrategy>>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            query: config.variant_query(),
            fallbacks: Fallbacks::from_config(config),
            strategies,
            notifier,
            store: StateStore::new(config.state_path.clone()),
            dry_run: false,
        }
    }

    /// In dry-run mode the check runs, but nothing is sent or written; the
    /// would-be message is logged instead.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub async fn run_once(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// [`RunController::run_once`] with an explicit clock, for tests.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let mut snapshot = self.store.load();
        let previous = snapshot.get(self.query.variant_id());

        tracing::info!(
            handle = self.query.handle(),
            variant_id = self.query.variant_id(),
            previous = ?previous.map(|p| p.available),
            dry_run = self.dry_run,
            "checking availability"
        );

        let outcome = check_availability(&self.strategies, &self.query).await;
        let mut report = RunReport {
            outcome,
            previous,
            notified: false,
            persisted: false,
        };

        match &report.outcome {
            CheckOutcome::Conclusive(result) => {
                if report.changed() {
                    let subject = self.subject(Some(result));
                    let text = message::stock_message(&subject, result.available, now);
                    report.notified = self.deliver(&text).await;
                } else {
                    tracing::info!(available = result.available, "no change since last run");
                }

                if self.dry_run {
                    tracing::info!("dry run: state file not written");
                } else {
                    snapshot.record(self.query.variant_id(), result.available, now.timestamp());
                    match self.store.save(&snapshot) {
                        Ok(()) => report.persisted = true,
                        Err(e) => {
                            tracing::error!(
                                path = %self.store.path().display(),
                                error = %e,
                                "failed to write state file"
                            );
                        }
                    }
                }
            }
            CheckOutcome::Inconclusive { failures } => {
                tracing::warn!(failures = failures.len(), "availability could not be determined");
                let text = message::ambiguous_warning(&self.subject(None), now);
                report.notified = self.deliver(&text).await;
            }
            CheckOutcome::Failed { failures } => {
                tracing::warn!(failures = failures.len(), "every strategy failed");
                let text = message::failure_warning(&self.subject(None), failures, now);
                report.notified = self.deliver(&text).await;
            }
        }

        tracing::info!(
            outcome = report.outcome.label(),
            available = ?report.available(),
            notified = report.notified,
            persisted = report.persisted,
            "run finished"
        );
        report
    }

    /// Sends a test message through the configured transport.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`NotifyError`](crate::NotifyError).
    pub async fn send_test_message(&self) -> Result<(), crate::NotifyError> {
        let text = message::test_message(&self.subject(None), Utc::now());
        self.notifier.send(&text).await
    }

    fn subject(&self, result: Option<&StockResult>) -> Subject {
        self.fallbacks.subject(&self.query, result)
    }

    async fn deliver(&self, text: &str) -> bool {
        if self.dry_run {
            tracing::info!(message = text, "dry run: notification not sent");
            return false;
        }
        match self.notifier.send(text).await {
            Ok(()) => {
                tracing::info!(notifier = self.notifier.name(), "notification sent");
                true
            }
            Err(e) => {
                tracing::error!(notifier = self.notifier.name(), error = %e, "notification failed");
                false
            }
        }
    }
}
