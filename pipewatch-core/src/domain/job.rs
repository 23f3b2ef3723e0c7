//! Job domain types

use serde::{Deserialize, Serialize};

use crate::domain::log::LogEntry;
use crate::domain::pipeline::PipelineStep;
use crate::domain::result::AnalysisResult;

/// Status of the remote pipeline job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` end a run; only a reset leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal payload of a run as reported by the job runner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutcome {
    pub result: Option<AnalysisResult>,
    pub jira_ticket: Option<String>,
    pub error: Option<String>,
}

/// Snapshot of the job as last observed
///
/// Snapshots are replaced wholesale, never patched field by field. The
/// result, ticket and error are only carried once the status is terminal,
/// and the error only when the status is `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    pub status: JobStatus,
    pub current_step: u8,
    pub logs: Vec<LogEntry>,
    pub result: Option<AnalysisResult>,
    pub jira_ticket: Option<String>,
    pub error: Option<String>,
}

impl JobState {
    /// The idle/zero state shown before any run and after a reset
    pub fn idle() -> Self {
        Self {
            status: JobStatus::Idle,
            current_step: 0,
            logs: Vec::new(),
            result: None,
            jira_ticket: None,
            error: None,
        }
    }

    /// The state shown right after the runner accepted a new run
    pub fn started() -> Self {
        Self {
            status: JobStatus::Running,
            ..Self::idle()
        }
    }

    /// Rebuilds a snapshot from a one-off fetch of status, logs and result
    ///
    /// Fields that the status does not allow are dropped, so a stale result
    /// left on the runner never shows up next to an idle or running job.
    pub fn restored(
        status: JobStatus,
        current_step: u8,
        logs: Vec<LogEntry>,
        outcome: JobOutcome,
    ) -> Self {
        let mut state = Self {
            status,
            current_step: clamp_step(current_step),
            logs,
            ..Self::idle()
        };
        if status.is_terminal() {
            state.apply_outcome(outcome);
        }
        state
    }

    /// Copies the terminal payload onto the snapshot
    pub(crate) fn apply_outcome(&mut self, outcome: JobOutcome) {
        self.result = outcome.result;
        self.jira_ticket = outcome.jira_ticket;
        self.error = if self.status == JobStatus::Error {
            outcome.error
        } else {
            None
        };
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// The step currently executing, if the counter points at one
    pub fn active_step(&self) -> Option<PipelineStep> {
        PipelineStep::from_number(self.current_step)
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Bounds a reported step counter to the pipeline's step range
pub fn clamp_step(step: u8) -> u8 {
    step.min(PipelineStep::COUNT)
}
