//! Job runner seam
//!
//! The controller talks to the job runner only through this trait, so tests
//! can drive it with an in-memory double instead of an HTTP server.

use async_trait::async_trait;
use pipewatch_client::{JobRunnerClient, Result};
use pipewatch_core::domain::log::LogEntry;
use pipewatch_core::dto::job::{ResultResponse, StatusResponse};

/// Operations the controller needs from the job runner
///
/// Implementations are plain request/response: no retry, no caching.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    /// Starts a new run; only acknowledges acceptance
    async fn start(&self) -> Result<()>;

    /// Clears the current job
    async fn reset(&self) -> Result<()>;

    async fn fetch_status(&self) -> Result<StatusResponse>;

    /// Full log of the current run, not a delta
    async fn fetch_logs(&self) -> Result<Vec<LogEntry>>;

    async fn fetch_result(&self) -> Result<ResultResponse>;
}

#[async_trait]
impl JobRunner for JobRunnerClient {
    async fn start(&self) -> Result<()> {
        JobRunnerClient::start(self).await
    }

    async fn reset(&self) -> Result<()> {
        JobRunnerClient::reset(self).await
    }

    async fn fetch_status(&self) -> Result<StatusResponse> {
        JobRunnerClient::fetch_status(self).await
    }

    async fn fetch_logs(&self) -> Result<Vec<LogEntry>> {
        JobRunnerClient::fetch_logs(self).await
    }

    async fn fetch_result(&self) -> Result<ResultResponse> {
        JobRunnerClient::fetch_result(self).await
    }
}
