//! In-memory job runner for controller tests

use async_trait::async_trait;
use pipewatch_client::{ClientError, Result};
use pipewatch_core::domain::job::JobStatus;
use pipewatch_core::domain::log::{LogEntry, LogLevel};
use pipewatch_core::dto::job::{ResultResponse, StatusResponse};
use std::sync::Mutex;
use std::time::Duration;

use crate::runner::JobRunner;

/// Number of calls made to each endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub start: u32,
    pub reset: u32,
    pub status: u32,
    pub logs: u32,
    pub result: u32,
}

#[derive(Debug)]
struct Remote {
    status: StatusResponse,
    logs: Vec<LogEntry>,
    result: ResultResponse,
    fail_start: bool,
    fail_reset: bool,
    failing_polls: u32,
    latency: Duration,
    next_status_latency: Option<Duration>,
    start_latency: Duration,
    calls: Calls,
    polls_in_flight: u32,
    max_polls_in_flight: u32,
}

/// A scripted job runner whose remote state tests set directly
#[derive(Debug)]
pub struct FakeRunner {
    remote: Mutex<Remote>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(Remote {
                status: StatusResponse {
                    status: JobStatus::Idle,
                    current_step: 0,
                },
                logs: Vec::new(),
                result: ResultResponse::default(),
                fail_start: false,
                fail_reset: false,
                failing_polls: 0,
                latency: Duration::ZERO,
                next_status_latency: None,
                start_latency: Duration::ZERO,
                calls: Calls::default(),
                polls_in_flight: 0,
                max_polls_in_flight: 0,
            }),
        }
    }

    pub fn set_status(&self, status: JobStatus, current_step: u8) {
        self.remote.lock().unwrap().status = StatusResponse {
            status,
            current_step,
        };
    }

    pub fn set_log_count(&self, n: usize) {
        self.remote.lock().unwrap().logs = (0..n)
            .map(|i| {
                LogEntry::new(
                    format!("09:00:{i:02}"),
                    format!("step output {i}"),
                    LogLevel::Info,
                )
            })
            .collect();
    }

    pub fn set_result(
        &self,
        result: serde_json::Value,
        jira_ticket: Option<&str>,
        error: Option<&str>,
    ) {
        self.remote.lock().unwrap().result = ResultResponse {
            result: serde_json::from_value(result).unwrap(),
            jira_ticket: jira_ticket.map(str::to_string),
            error: error.map(str::to_string),
        };
    }

    pub fn fail_start(&self) {
        self.remote.lock().unwrap().fail_start = true;
    }

    pub fn fail_reset(&self) {
        self.remote.lock().unwrap().fail_reset = true;
    }

    /// Makes the next `n` status fetches fail
    pub fn fail_polls(&self, n: u32) {
        self.remote.lock().unwrap().failing_polls = n;
    }

    /// Delay applied to every status fetch
    pub fn set_latency(&self, latency: Duration) {
        self.remote.lock().unwrap().latency = latency;
    }

    /// Delay for the next status fetch only, overriding the regular latency
    pub fn delay_next_status(&self, latency: Duration) {
        self.remote.lock().unwrap().next_status_latency = Some(latency);
    }

    /// Delay before a start request is answered
    pub fn set_start_latency(&self, latency: Duration) {
        self.remote.lock().unwrap().start_latency = latency;
    }

    pub fn calls(&self) -> Calls {
        self.remote.lock().unwrap().calls
    }

    pub fn max_polls_in_flight(&self) -> u32 {
        self.remote.lock().unwrap().max_polls_in_flight
    }

    fn unavailable() -> ClientError {
        ClientError::api_error(503, "job runner unavailable")
    }
}

#[async_trait]
impl JobRunner for FakeRunner {
    async fn start(&self) -> Result<()> {
        let latency = {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.start += 1;
            remote.start_latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut remote = self.remote.lock().unwrap();
        if remote.fail_start {
            return Err(Self::unavailable());
        }
        remote.status = StatusResponse {
            status: JobStatus::Running,
            current_step: 0,
        };
        remote.logs.clear();
        remote.result = ResultResponse::default();
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut remote = self.remote.lock().unwrap();
        remote.calls.reset += 1;
        if remote.fail_reset {
            return Err(Self::unavailable());
        }
        remote.status = StatusResponse {
            status: JobStatus::Idle,
            current_step: 0,
        };
        remote.logs.clear();
        remote.result = ResultResponse::default();
        Ok(())
    }

    /// The status is read when the request arrives and delivered after the
    /// latency, like a response still in transit.
    async fn fetch_status(&self) -> Result<StatusResponse> {
        let (status, latency) = {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.status += 1;
            remote.polls_in_flight += 1;
            remote.max_polls_in_flight = remote.max_polls_in_flight.max(remote.polls_in_flight);
            let latency = remote.next_status_latency.take().unwrap_or(remote.latency);
            (remote.status.clone(), latency)
        };
        let _in_flight = InFlight(&self.remote);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut remote = self.remote.lock().unwrap();
        if remote.failing_polls > 0 {
            remote.failing_polls -= 1;
            return Err(Self::unavailable());
        }
        Ok(status)
    }

    async fn fetch_logs(&self) -> Result<Vec<LogEntry>> {
        let mut remote = self.remote.lock().unwrap();
        remote.calls.logs += 1;
        Ok(remote.logs.clone())
    }

    async fn fetch_result(&self) -> Result<ResultResponse> {
        let mut remote = self.remote.lock().unwrap();
        remote.calls.result += 1;
        Ok(remote.result.clone())
    }
}

/// Counts a status fetch as in flight until it completes or is dropped
struct InFlight<'a>(&'a Mutex<Remote>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut remote = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        remote.polls_in_flight -= 1;
    }
}
