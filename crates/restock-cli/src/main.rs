mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "restock")]
#[command(about = "Watch one storefront variant and notify when its stock state changes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one availability check (the default when no command is given).
    Check {
        /// Check and log, but send nothing and leave the state file alone.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the persisted record for the configured variant.
    State,
    /// Send a test message through the configured notifier.
    NotifyTest,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = restock_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Check { dry_run: false }) {
        Commands::Check { dry_run } => commands::run_check(&config, dry_run).await,
        Commands::State => commands::show_state(&config),
        Commands::NotifyTest => commands::notify_test(&config).await,
    }
}
