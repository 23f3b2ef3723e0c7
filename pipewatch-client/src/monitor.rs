//! Monitoring endpoints: status, logs and result of the current job

use pipewatch_core::domain::log::LogEntry;
use pipewatch_core::dto::job::{LogsResponse, ResultResponse, StatusResponse};

use crate::JobRunnerClient;
use crate::error::Result;

impl JobRunnerClient {
    /// Get the job status and step counter
    pub async fn fetch_status(&self) -> Result<StatusResponse> {
        let response = self.client.get(self.url("/api/status")).send().await?;

        self.handle_response(response).await
    }

    /// Get the full log of the current run
    ///
    /// Each call returns everything logged so far, not a delta.
    pub async fn fetch_logs(&self) -> Result<Vec<LogEntry>> {
        let response = self.client.get(self.url("/api/logs")).send().await?;

        let body: LogsResponse = self.handle_response(response).await?;
        Ok(body.logs)
    }

    /// Get the terminal result, ticket and error of the current run
    pub async fn fetch_result(&self) -> Result<ResultResponse> {
        let response = self.client.get(self.url("/api/result")).send().await?;

        self.handle_response(response).await
    }
}
