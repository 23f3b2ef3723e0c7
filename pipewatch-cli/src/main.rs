//! Pipewatch CLI
//!
//! Terminal dashboard for the compliance document pipeline: start and reset
//! runs on the job runner and follow their progress.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use pipewatch_sync::SyncConfig;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipewatch")]
#[command(about = "Compliance pipeline dashboard", long_about = None)]
struct Cli {
    /// Job runner URL
    #[arg(long, env = "PIPEWATCH_RUNNER_URL", default_value = "http://localhost:8000")]
    runner_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "PIPEWATCH_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// JIRA base URL used to link created tickets (e.g. https://acme.atlassian.net)
    #[arg(long, env = "PIPEWATCH_JIRA_URL")]
    jira_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pipewatch_cli=info,pipewatch_sync=warn,pipewatch_client=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        runner_url: cli.runner_url,
        timeout: Duration::from_secs(cli.timeout_secs),
        jira_url: cli.jira_url,
        sync: SyncConfig::from_env(),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
