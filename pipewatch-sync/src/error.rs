//! Error types for the sync controller

use pipewatch_client::ClientError;
use pipewatch_core::domain::job::JobStatus;
use thiserror::Error;

/// A command the operator issues against the job runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Reset,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run => f.write_str("run"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

/// Errors surfaced to the operator
///
/// Failed poll ticks never show up here; they are retried by the scheduler.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The runner did not accept the command
    #[error("Failed to {op} pipeline: {source}")]
    Command {
        op: Command,
        #[source]
        source: ClientError,
    },

    /// The command is not valid from the current status
    #[error("Cannot {op} pipeline while it is {from}")]
    InvalidTransition { op: Command, from: JobStatus },

    /// A reset landed while the run request was in flight
    #[error("Pipeline was reset before the run request completed")]
    Superseded,

    /// Restoring the view from the runner failed
    #[error("Failed to fetch job state: {0}")]
    Fetch(#[from] ClientError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    pub(crate) fn command(op: Command) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Command { op, source }
    }
}
