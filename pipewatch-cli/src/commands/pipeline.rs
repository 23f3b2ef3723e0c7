//! Pipeline command handlers
//!
//! Handles starting, resetting and inspecting the pipeline job, and
//! following a run while it is in progress.

use anyhow::{Context, Result};
use colored::*;
use pipewatch_sync::{SyncError, SyncEvent};
use tokio::sync::broadcast::error::RecvError;

use super::Controller;
use super::view::{self, Progress};
use crate::config::Config;

const UNREACHABLE: &str = "Failed to reach the job runner. Make sure the backend is running";

/// Show the current job
pub async fn show_status(controller: &Controller, config: &Config) -> Result<()> {
    controller.initialize().await.context(UNREACHABLE)?;
    controller.shutdown();

    view::print_state(&controller.snapshot(), config);

    Ok(())
}

/// Start a new run, optionally clearing a finished one and following it
pub async fn run_pipeline(
    controller: &Controller,
    config: &Config,
    follow: bool,
    reset: bool,
) -> Result<()> {
    controller.initialize().await.context(UNREACHABLE)?;

    if reset && controller.snapshot().status.is_terminal() {
        controller
            .reset_pipeline()
            .await
            .context("Failed to clear the previous run")?;
        println!("{}", "Previous run cleared".dimmed());
    }

    match controller.run_pipeline().await {
        Ok(()) => {}
        Err(SyncError::InvalidTransition { from, .. }) if from.is_terminal() => {
            anyhow::bail!("The previous run is {from}; reset it first or pass --reset");
        }
        Err(SyncError::InvalidTransition { .. }) => {
            anyhow::bail!("A run is already in progress; use `pipewatch watch` to follow it");
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(
                "Failed to start pipeline. Make sure the backend is running",
            ));
        }
    }

    println!("{}", "✓ Pipeline started".green());

    if follow {
        follow_run(controller, config).await
    } else {
        controller.shutdown();
        Ok(())
    }
}

/// Clear the current job
pub async fn reset_pipeline(controller: &Controller) -> Result<()> {
    controller
        .reset_pipeline()
        .await
        .context("Failed to reset pipeline")?;

    println!("{}", "✓ Pipeline reset".green());

    Ok(())
}

/// Follow the current run if there is one, otherwise show the job
pub async fn watch(controller: &Controller, config: &Config) -> Result<()> {
    controller.initialize().await.context(UNREACHABLE)?;

    if controller.is_polling() {
        follow_run(controller, config).await
    } else {
        view::print_state(&controller.snapshot(), config);
        Ok(())
    }
}

/// Print the log of the current run
pub async fn show_logs(controller: &Controller, config: &Config, follow: bool) -> Result<()> {
    controller.initialize().await.context(UNREACHABLE)?;

    if follow && controller.is_polling() {
        return follow_run(controller, config).await;
    }
    controller.shutdown();

    let state = controller.snapshot();
    if state.logs.is_empty() {
        println!("{}", "No logs yet.".yellow());
    } else {
        view::print_logs(&state.logs);
    }

    Ok(())
}

/// Print progress as snapshots arrive until the run leaves `running`
async fn follow_run(controller: &Controller, config: &Config) -> Result<()> {
    let mut snapshots = controller.subscribe();
    let mut events = controller.events();
    let mut progress = Progress::default();

    loop {
        let state = snapshots.borrow_and_update().clone();
        progress.update(&state);
        if !state.is_running() {
            break;
        }

        tokio::select! {
            changed = snapshots.changed() => changed.context("Controller stopped")?,
            event = events.recv() => match event {
                Ok(event) => {
                    view::print_event(&event);
                    if matches!(event, SyncEvent::PollingSuspended { .. }) {
                        anyhow::bail!(
                            "Lost contact with the job runner; the run may still be in progress"
                        );
                    }
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => anyhow::bail!("Controller stopped"),
            },
            _ = tokio::signal::ctrl_c() => {
                controller.shutdown();
                println!();
                println!("{}", "Stopped following; the run continues on the job runner.".dimmed());
                return Ok(());
            }
        }
    }

    // Events raised by the final transition are published before its snapshot.
    while let Ok(event) = events.try_recv() {
        view::print_event(&event);
    }

    println!();
    view::print_state(&controller.snapshot(), config);

    Ok(())
}
