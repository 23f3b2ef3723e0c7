//! Pipeline control endpoints

use crate::JobRunnerClient;
use crate::error::Result;
use tracing::debug;

impl JobRunnerClient {
    /// Ask the runner to start a new pipeline run
    ///
    /// The runner only acknowledges the request; progress has to be polled.
    pub async fn start(&self) -> Result<()> {
        debug!("Requesting pipeline run from {}", self.base_url);
        let response = self.client.post(self.url("/api/pipeline/run")).send().await?;

        self.handle_empty_response(response).await
    }

    /// Ask the runner to clear the current job
    pub async fn reset(&self) -> Result<()> {
        debug!("Requesting pipeline reset from {}", self.base_url);
        let response = self.client.post(self.url("/api/pipeline/reset")).send().await?;

        self.handle_empty_response(response).await
    }
}
