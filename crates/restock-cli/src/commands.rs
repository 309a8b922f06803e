//! Command handlers wiring configuration into the scraper and monitor crates.

use std::sync::Arc;

use anyhow::Context;
use restock_core::AppConfig;
use restock_monitor::{notifier_from_settings, RunController, StateStore};
use restock_scraper::{default_chain, RetryPolicy, StorefrontClient};

fn build_controller(config: &AppConfig) -> anyhow::Result<RunController> {
    let client = StorefrontClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        RetryPolicy::from_settings(&config.retry),
        &config.relay_url_template,
    )
    .context("failed to build storefront HTTP client")?;
    let notifier = notifier_from_settings(config.telegram.as_ref(), config.request_timeout_secs)
        .context("failed to build notifier")?;
    Ok(RunController::new(
        config,
        default_chain(&Arc::new(client)),
        notifier,
    ))
}

/// One check. Degraded outcomes are reported through notifications and the
/// log; they do not make the process exit non-zero.
pub(crate) async fn run_check(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let controller = build_controller(config)?.with_dry_run(dry_run);
    let report = controller.run_once().await;

    let status = report
        .available()
        .map_or("unknown", |a| if a { "available" } else { "sold out" });
    println!(
        "{}: {status} (changed: {}, notified: {}, persisted: {})",
        report.outcome.label(),
        report.changed(),
        report.notified,
        report.persisted
    );
    Ok(())
}

pub(crate) fn show_state(config: &AppConfig) -> anyhow::Result<()> {
    let store = StateStore::new(config.state_path.clone());
    match store.load().get(config.variant_id) {
        Some(record) => {
            let recorded_at = chrono::DateTime::from_timestamp(record.ts, 0).map_or_else(
                || "unknown".to_owned(),
                |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "variant_id": config.variant_id,
                    "available": record.available,
                    "ts": record.ts,
                    "recorded_at": recorded_at,
                }))?
            );
        }
        None => println!(
            "no state recorded for variant {} in {}",
            config.variant_id,
            store.path().display()
        ),
    }
    Ok(())
}

/// Unlike `check`, a delivery failure here is an error: the point is to
/// verify the transport.
pub(crate) async fn notify_test(config: &AppConfig) -> anyhow::Result<()> {
    let controller = build_controller(config)?;
    controller
        .send_test_message()
        .await
        .context("test notification failed")?;
    println!("test notification sent");
    Ok(())
}
