//! Pipeline sync controller
//!
//! Owns the single job snapshot, issues run/reset commands and drives the
//! poll loop while a run is active.
//!
//! Every write to the snapshot is tagged with an epoch. Commands that start
//! or clear a run move to a new epoch inside the snapshot's write lock, and
//! poll results are applied under the same lock only if their epoch is still
//! current. A tick that was in flight when the pipeline was reset therefore
//! never touches the snapshot, whichever thread it completes on.
//!
//! Every accepted write also bumps a revision. A restore from a one-off
//! fetch only lands if no other write happened while it was fetching.

use async_trait::async_trait;
use pipewatch_client::ClientError;
use pipewatch_core::domain::job::{JobOutcome, JobState, JobStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{Command, SyncError};
use crate::event::SyncEvent;
use crate::reconciler::{self, Observation, Reconciliation};
use crate::runner::JobRunner;
use crate::scheduler::{PollScheduler, PollTask, TickOutcome};

const EVENT_BUFFER_SIZE: usize = 16;

/// Snapshot, event channel and epoch shared with the poll task
struct Shared {
    state: watch::Sender<JobState>,
    events: broadcast::Sender<SyncEvent>,
    epoch: AtomicU64,
    revision: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(JobState::idle());
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            state,
            events,
            epoch: AtomicU64::new(0),
            revision: AtomicU64::new(0),
        }
    }

    /// Current status together with the epoch it belongs to
    fn current(&self) -> (JobStatus, u64) {
        let state = self.state.borrow();
        (state.status, self.epoch.load(Ordering::Acquire))
    }

    /// Revision of the current snapshot
    fn revision(&self) -> u64 {
        let _state = self.state.borrow();
        self.revision.load(Ordering::Acquire)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    /// Records a write; only called while holding the snapshot's write lock
    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Moves to a new epoch with `next` as its snapshot
    fn advance(&self, next: JobState) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
            self.bump_revision();
            *state = next;
        });
        epoch
    }

    /// Moves to a running epoch, unless `expected` was superseded meanwhile
    fn begin_run(&self, expected: u64) -> Option<u64> {
        let mut epoch = None;
        self.state.send_if_modified(|state| {
            if !self.is_current(expected) {
                return false;
            }
            epoch = Some(self.epoch.fetch_add(1, Ordering::AcqRel) + 1);
            self.bump_revision();
            *state = JobState::started();
            true
        });
        epoch
    }

    /// Replaces the snapshot if it is still at `revision`
    ///
    /// Returns the epoch the snapshot now belongs to, or `None` if any write
    /// landed since `revision` was read.
    fn restore(&self, revision: u64, next: JobState) -> Option<u64> {
        let mut epoch = None;
        self.state.send_if_modified(|state| {
            if self.revision.load(Ordering::Acquire) != revision {
                return false;
            }
            epoch = Some(self.epoch.load(Ordering::Acquire));
            self.bump_revision();
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        epoch
    }

    /// Merges a poll observation within `epoch`
    ///
    /// Returns whether polling should stop, or `None` if the epoch is stale.
    /// An event raised by the merge is published before the new snapshot, so
    /// a subscriber that sees the snapshot can already receive the event.
    fn reconcile(&self, epoch: u64, observation: Observation) -> Option<bool> {
        let mut stop = None;
        self.state.send_if_modified(|state| {
            if !self.is_current(epoch) {
                return false;
            }
            self.bump_revision();
            let Reconciliation {
                state: next,
                stop: done,
                event,
            } = reconciler::reconcile(state, observation);
            if let Some(event) = event {
                self.notify(event);
            }
            stop = Some(done);
            match next {
                Some(next) => {
                    *state = next;
                    true
                }
                None => false,
            }
        });
        stop
    }

    fn notify(&self, event: SyncEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for sync event");
        }
    }
}

/// Keeps a local, read-only view of the remote pipeline job
///
/// Consumers read snapshots through [`snapshot`](Self::snapshot) or a
/// [`subscribe`](Self::subscribe) receiver and never write back. Dropping
/// the controller stops polling.
pub struct PipelineSyncController<R: JobRunner> {
    runner: Arc<R>,
    shared: Arc<Shared>,
    scheduler: Mutex<PollScheduler>,
    config: SyncConfig,
}

impl<R: JobRunner> PipelineSyncController<R> {
    /// Creates a controller with an idle snapshot
    ///
    /// Call [`initialize`](Self::initialize) to load the runner's state.
    pub fn new(runner: Arc<R>, config: SyncConfig) -> Self {
        Self {
            runner,
            shared: Arc::new(Shared::new()),
            scheduler: Mutex::new(PollScheduler::new()),
            config,
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> JobState {
        self.shared.state.borrow().clone()
    }

    /// A receiver that is notified whenever the snapshot is replaced
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.shared.state.subscribe()
    }

    /// A receiver for one-shot notifications raised from now on
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler().is_active()
    }

    /// Restores the view from the runner after startup or a reload
    ///
    /// Status, logs and result are fetched once regardless of status. Polling
    /// starts only if the runner reports a run in progress. Calling this again
    /// after polling was suspended resynchronizes and resumes. If the snapshot
    /// changes while the fetches are in flight, the newer snapshot is kept.
    pub async fn initialize(&self) -> Result<(), SyncError> {
        let revision = self.shared.revision();

        let (status, logs, result) = tokio::try_join!(
            self.runner.fetch_status(),
            self.runner.fetch_logs(),
            self.runner.fetch_result()
        )?;

        let state = JobState::restored(status.status, status.current_step, logs, result.into());
        let running = state.is_running();
        info!(
            status = %state.status,
            step = state.current_step,
            logs = state.logs.len(),
            "Restored job state from runner"
        );

        let Some(epoch) = self.shared.restore(revision, state) else {
            debug!("Job state changed while restoring, keeping the newer state");
            return Ok(());
        };

        if running {
            self.start_polling(epoch);
        }

        Ok(())
    }

    /// Starts a new run and begins polling
    ///
    /// The local snapshot only turns `running` once the runner accepted the
    /// run; on failure it is left as it was.
    pub async fn run_pipeline(&self) -> Result<(), SyncError> {
        let (status, epoch) = self.shared.current();
        if status != JobStatus::Idle {
            return Err(SyncError::InvalidTransition {
                op: Command::Run,
                from: status,
            });
        }

        info!("Starting pipeline run");
        self.runner
            .start()
            .await
            .map_err(SyncError::command(Command::Run))?;

        let epoch = self.shared.begin_run(epoch).ok_or(SyncError::Superseded)?;
        self.restart_polling(epoch);

        Ok(())
    }

    /// Clears the job on the runner and locally
    ///
    /// Polling stops and the snapshot returns to idle before the reset
    /// request is sent, so the local view is cleared even if the request
    /// fails. The failure is still returned.
    pub async fn reset_pipeline(&self) -> Result<(), SyncError> {
        self.stop_polling();
        self.shared.advance(JobState::idle());

        info!("Resetting pipeline");
        self.runner
            .reset()
            .await
            .map_err(SyncError::command(Command::Reset))
    }

    /// Stops polling; the snapshot keeps its last value
    pub fn shutdown(&self) {
        if self.stop_polling() {
            info!("Stopped polling");
        }
    }

    fn scheduler(&self) -> MutexGuard<'_, PollScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll_task(&self, epoch: u64) -> SyncTask<R> {
        SyncTask {
            runner: Arc::clone(&self.runner),
            shared: Arc::clone(&self.shared),
            epoch,
        }
    }

    fn start_polling(&self, epoch: u64) {
        let task = self.poll_task(epoch);
        self.scheduler()
            .start(self.config.poll_interval, self.config.retry, task);
    }

    /// Replaces any poll loop, including one that is finishing on its own
    fn restart_polling(&self, epoch: u64) {
        let task = self.poll_task(epoch);
        let mut scheduler = self.scheduler();
        scheduler.stop();
        scheduler.start(self.config.poll_interval, self.config.retry, task);
    }

    fn stop_polling(&self) -> bool {
        self.scheduler().stop()
    }
}

/// One poll tick: fetch, reconcile, and report whether to keep going
struct SyncTask<R: JobRunner> {
    runner: Arc<R>,
    shared: Arc<Shared>,
    epoch: u64,
}

#[async_trait]
impl<R: JobRunner> PollTask for SyncTask<R> {
    async fn tick(&mut self) -> TickOutcome {
        let (status, logs) = tokio::join!(self.runner.fetch_status(), self.runner.fetch_logs());
        let (status, logs) = match (status, logs) {
            (Ok(status), Ok(logs)) => (status, logs),
            (Err(e), _) | (_, Err(e)) => return TickOutcome::Failed(e),
        };

        // The result is only asked for once this tick's status says the run ended.
        let outcome = if reconciler::needs_outcome(status.status) {
            match self.runner.fetch_result().await {
                Ok(result) => Some(JobOutcome::from(result)),
                Err(e) => return TickOutcome::Failed(e),
            }
        } else {
            None
        };

        debug!(
            status = %status.status,
            step = status.current_step,
            logs = logs.len(),
            "Poll tick"
        );

        let observation = Observation {
            status,
            logs,
            outcome,
        };
        let Some(stop) = self.shared.reconcile(self.epoch, observation) else {
            debug!("Discarding poll result from a superseded run");
            return TickOutcome::Stop;
        };

        if stop {
            TickOutcome::Stop
        } else {
            TickOutcome::Continue
        }
    }

    fn on_exhausted(&mut self, failures: u32, error: &ClientError) {
        if self.shared.is_current(self.epoch) {
            self.shared.notify(SyncEvent::PollingSuspended {
                consecutive_failures: failures,
                last_error: error.to_string(),
            });
        }
    }
}
