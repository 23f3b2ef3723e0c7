//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod view;

use anyhow::{Context, Result};
use clap::Subcommand;
use pipewatch_client::JobRunnerClient;
use pipewatch_sync::PipelineSyncController;
use std::sync::Arc;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current job: status, steps, result and ticket
    Status,
    /// Start a new pipeline run
    Run {
        /// Follow progress until the run ends
        #[arg(short, long)]
        follow: bool,

        /// Reset a finished run before starting
        #[arg(long)]
        reset: bool,
    },
    /// Clear the current job
    Reset,
    /// Follow the current run, if any, then show the outcome
    Watch,
    /// Print the log of the current run
    Logs {
        /// Keep printing new lines until the run ends
        #[arg(short, long)]
        follow: bool,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let controller = connect(config)?;

    match command {
        Commands::Status => pipeline::show_status(&controller, config).await,
        Commands::Run { follow, reset } => {
            pipeline::run_pipeline(&controller, config, follow, reset).await
        }
        Commands::Reset => pipeline::reset_pipeline(&controller).await,
        Commands::Watch => pipeline::watch(&controller, config).await,
        Commands::Logs { follow } => pipeline::show_logs(&controller, config, follow).await,
    }
}

pub(crate) type Controller = PipelineSyncController<JobRunnerClient>;

fn connect(config: &Config) -> Result<Controller> {
    let client = JobRunnerClient::with_timeout(&config.runner_url, config.timeout)
        .context("Failed to build HTTP client")?;
    tracing::debug!("Using job runner at {}", client.base_url());

    Ok(PipelineSyncController::new(Arc::new(client), config.sync))
}
