//! Poll scheduler
//!
//! Runs a [`PollTask`] periodically on a background task until the task asks
//! to stop, the retry budget runs out, or the scheduler is stopped.
//!
//! Ticks never overlap: the next tick is scheduled from the start of the
//! previous one and only begins once it has finished, so a slow tick delays
//! the next one instead of stacking calls. Stopping cancels the loop, and a
//! tick in flight at that moment is dropped before its result is used.

use async_trait::async_trait;
use pipewatch_client::ClientError;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RetryPolicy;

/// What a tick asks the scheduler to do next
#[derive(Debug)]
pub enum TickOutcome {
    /// Keep polling at the regular period
    Continue,
    /// End the poll loop
    Stop,
    /// The tick failed; retry according to the policy
    Failed(ClientError),
}

/// Work performed on every tick
#[async_trait]
pub trait PollTask: Send + 'static {
    async fn tick(&mut self) -> TickOutcome;

    /// Called once when the retry budget is exhausted, before the loop ends
    fn on_exhausted(&mut self, _failures: u32, _error: &ClientError) {}
}

struct ActivePoll {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owner of the single active poll loop
#[derive(Default)]
pub struct PollScheduler {
    active: Option<ActivePoll>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a poll loop is scheduled and has not ended on its own
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Starts polling `task` every `period`
    ///
    /// Returns `false` without doing anything if a loop is already active.
    pub fn start<T: PollTask>(&mut self, period: Duration, retry: RetryPolicy, task: T) -> bool {
        if self.is_active() {
            debug!("Poll loop already active");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(task, period, retry, cancel.clone()));
        self.active = Some(ActivePoll { cancel, handle });
        true
    }

    /// Cancels the active poll loop, if any
    ///
    /// Returns whether a loop was scheduled. No tick starts after this
    /// returns, and a tick in flight is dropped at its next suspension point.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poll_loop<T: PollTask>(
    mut task: T,
    period: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
) {
    info!(period_ms = period.as_millis() as u64, "Poll loop started");

    let mut failures: u32 = 0;
    let mut next_tick = Instant::now() + period;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Poll loop cancelled");
                break;
            }
            _ = time::sleep_until(next_tick) => {}
        }

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Poll loop cancelled with a tick in flight");
                break;
            }
            outcome = task.tick() => outcome,
        };

        match outcome {
            TickOutcome::Continue => {
                failures = 0;
                next_tick = started + period;
            }
            TickOutcome::Stop => {
                info!("Poll loop finished");
                break;
            }
            TickOutcome::Failed(e) => {
                failures += 1;

                if retry.is_exhausted(failures) {
                    error!(
                        "Poll tick failed {} times in a row, suspending polling: {}",
                        failures, e
                    );
                    task.on_exhausted(failures, &e);
                    break;
                }

                let delay = retry.delay_after(period, failures);
                warn!(
                    "Poll tick failed (attempt {}), retrying in {:?}: {}",
                    failures, delay, e
                );
                next_tick = started + delay;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy)]
    enum Scripted {
        Continue,
        Fail,
        Stop,
    }

    /// Records tick start times and replays scripted outcomes
    struct Recorder {
        outcomes: VecDeque<Scripted>,
        latency: Duration,
        started_at: Arc<Mutex<Vec<Duration>>>,
        in_flight: Arc<AtomicU32>,
        max_in_flight: Arc<AtomicU32>,
        exhausted: Arc<AtomicU32>,
        origin: Instant,
    }

    impl Recorder {
        fn new(outcomes: Vec<Scripted>, latency: Duration) -> Self {
            Self {
                outcomes: outcomes.into(),
                latency,
                started_at: Arc::default(),
                in_flight: Arc::default(),
                max_in_flight: Arc::default(),
                exhausted: Arc::default(),
                origin: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl PollTask for Recorder {
        async fn tick(&mut self) -> TickOutcome {
            self.started_at.lock().unwrap().push(self.origin.elapsed());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            time::sleep(self.latency).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.outcomes.pop_front().unwrap_or(Scripted::Continue) {
                Scripted::Continue => TickOutcome::Continue,
                Scripted::Fail => TickOutcome::Failed(ClientError::api_error(503, "unavailable")),
                Scripted::Stop => TickOutcome::Stop,
            }
        }

        fn on_exhausted(&mut self, failures: u32, _error: &ClientError) {
            self.exhausted.store(failures, Ordering::SeqCst);
        }
    }

    fn secs(starts: &Mutex<Vec<Duration>>) -> Vec<u64> {
        starts.lock().unwrap().iter().map(|d| d.as_secs()).collect()
    }

    const PERIOD: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_period() {
        let task = Recorder::new(Vec::new(), Duration::ZERO);
        let starts = Arc::clone(&task.started_at);
        let mut scheduler = PollScheduler::new();

        assert!(scheduler.start(PERIOD, RetryPolicy::default(), task));
        time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(secs(&starts), vec![1, 2, 3]);
        assert!(scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_is_a_no_op() {
        let first = Recorder::new(Vec::new(), Duration::ZERO);
        let second = Recorder::new(Vec::new(), Duration::ZERO);
        let second_starts = Arc::clone(&second.started_at);
        let mut scheduler = PollScheduler::new();

        assert!(scheduler.start(PERIOD, RetryPolicy::default(), first));
        assert!(!scheduler.start(PERIOD, RetryPolicy::default(), second));
        time::sleep(Duration::from_millis(2500)).await;

        assert!(second_starts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_delays_next_without_overlap() {
        let task = Recorder::new(Vec::new(), Duration::from_millis(2500));
        let starts = Arc::clone(&task.started_at);
        let max_in_flight = Arc::clone(&task.max_in_flight);
        let mut scheduler = PollScheduler::new();

        scheduler.start(PERIOD, RetryPolicy::default(), task);
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        // Each tick starts as soon as the previous one finishes.
        assert_eq!(secs(&starts), vec![1, 3, 6, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_outcome_ends_loop() {
        let task = Recorder::new(vec![Scripted::Continue, Scripted::Stop], Duration::ZERO);
        let starts = Arc::clone(&task.started_at);
        let mut scheduler = PollScheduler::new();

        scheduler.start(PERIOD, RetryPolicy::default(), task);
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(secs(&starts), vec![1, 2]);
        assert!(!scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_tick_in_flight() {
        let task = Recorder::new(Vec::new(), Duration::from_millis(800));
        let starts = Arc::clone(&task.started_at);
        let in_flight = Arc::clone(&task.in_flight);
        let mut scheduler = PollScheduler::new();

        scheduler.start(PERIOD, RetryPolicy::default(), task);
        time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(in_flight.load(Ordering::SeqCst), 1);

        assert!(scheduler.stop());
        assert!(!scheduler.is_active());
        time::sleep(Duration::from_secs(5)).await;

        // The dropped tick never reached its end.
        assert_eq!(in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(secs(&starts), vec![1]);
        assert!(!scheduler.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_back_off_and_recover() {
        let task = Recorder::new(vec![Scripted::Fail; 3], Duration::ZERO);
        let starts = Arc::clone(&task.started_at);
        let mut scheduler = PollScheduler::new();

        scheduler.start(PERIOD, RetryPolicy::default(), task);
        time::sleep(Duration::from_millis(10_500)).await;

        // 1s, 2s and 4s waits after the failures, then back to the period.
        assert_eq!(secs(&starts), vec![1, 2, 4, 8, 9, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_suspends_polling() {
        let policy = RetryPolicy {
            max_consecutive_failures: 3,
            backoff_cap: Duration::from_secs(2),
        };
        let task = Recorder::new(vec![Scripted::Fail; 10], Duration::ZERO);
        let starts = Arc::clone(&task.started_at);
        let exhausted = Arc::clone(&task.exhausted);
        let mut scheduler = PollScheduler::new();

        scheduler.start(PERIOD, policy, task);
        time::sleep(Duration::from_secs(20)).await;

        assert_eq!(secs(&starts), vec![1, 2, 4]);
        assert_eq!(exhausted.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_loop() {
        let task = Recorder::new(Vec::new(), Duration::ZERO);
        let starts = Arc::clone(&task.started_at);

        let mut scheduler = PollScheduler::new();
        scheduler.start(PERIOD, RetryPolicy::default(), task);
        time::sleep(Duration::from_millis(1500)).await;
        drop(scheduler);
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(secs(&starts), vec![1]);
    }
}
