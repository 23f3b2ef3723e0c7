//! State reconciler
//!
//! Pure merge of one poll tick's responses into the next snapshot. The
//! reconciler never performs I/O; the controller fetches, then hands the
//! responses over together with the snapshot they apply to.

use pipewatch_core::domain::job::{JobOutcome, JobState, JobStatus, clamp_step};
use pipewatch_core::domain::log::LogEntry;
use pipewatch_core::dto::job::StatusResponse;
use tracing::{debug, info};

use crate::event::SyncEvent;

/// Responses gathered during one poll tick
#[derive(Debug, Clone)]
pub struct Observation {
    pub status: StatusResponse,
    pub logs: Vec<LogEntry>,
    /// Present when `status` is terminal
    pub outcome: Option<JobOutcome>,
}

/// Result of merging an observation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The next snapshot, or `None` when the current one stays as is
    pub state: Option<JobState>,
    /// Whether polling should end
    pub stop: bool,
    /// One-shot notification raised by this transition
    pub event: Option<SyncEvent>,
}

impl Reconciliation {
    fn unchanged(stop: bool) -> Self {
        Self {
            state: None,
            stop,
            event: None,
        }
    }
}

/// Whether a tick that observed `status` must also fetch the result
pub fn needs_outcome(status: JobStatus) -> bool {
    status.is_terminal()
}

/// Merges `observation` into `current`
///
/// Only a running snapshot accepts observations. Once a terminal state has
/// been applied, later observations are no-ops, which keeps the result,
/// ticket and error of the first terminal observation.
pub fn reconcile(current: &JobState, observation: Observation) -> Reconciliation {
    if current.status != JobStatus::Running {
        debug!(status = %current.status, "Ignoring observation for a job that is not running");
        return Reconciliation::unchanged(true);
    }

    let Observation {
        status,
        logs,
        outcome,
    } = observation;

    let reported = clamp_step(status.current_step);
    let current_step = reported.max(current.current_step);
    if reported < current.current_step {
        debug!(
            reported,
            kept = current.current_step,
            "Ignoring step counter regression"
        );
    }

    let (next, stop, event) = match status.status {
        JobStatus::Idle => {
            info!("Job was cleared on the runner");
            (JobState::idle(), true, None)
        }
        JobStatus::Running => {
            let next = JobState {
                current_step,
                logs,
                ..JobState::started()
            };
            (next, false, None)
        }
        terminal @ (JobStatus::Completed | JobStatus::Error) => {
            let next =
                JobState::restored(terminal, current_step, logs, outcome.unwrap_or_default());
            info!(status = %terminal, step = current_step, "Run reached a terminal state");

            let event = next
                .result
                .as_ref()
                .filter(|result| result.is_no_new_items())
                .map(|_| SyncEvent::no_new_items());
            (next, true, event)
        }
    };

    Reconciliation {
        state: (next != *current).then_some(next),
        stop,
        event,
    }
}
