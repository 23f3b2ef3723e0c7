//! Pipewatch HTTP Client
//!
//! A thin, type-safe client for the job runner that executes the
//! document-processing pipeline.
//!
//! Every call is a single request/response: there is no retry, caching or
//! state here. Callers decide what a failure means.
//!
//! # Example
//!
//! ```no_run
//! use pipewatch_client::JobRunnerClient;
//!
//! #[tokio::main]
//! async fn main() -> pipewatch_client::Result<()> {
//!     let client = JobRunnerClient::new("http://localhost:8000");
//!
//!     client.start().await?;
//!     let status = client.fetch_status().await?;
//!
//!     println!("{} at step {}", status.status, status.current_step);
//!     Ok(())
//! }
//! ```

pub mod error;
mod monitor;
mod pipeline;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{ClientError, FailureKind, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the job runner API
///
/// Endpoints are grouped as:
/// - Pipeline control (run, reset)
/// - Monitoring (status, logs, result)
#[derive(Debug, Clone)]
pub struct JobRunnerClient {
    /// Base URL of the job runner (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl JobRunnerClient {
    /// Create a new job runner client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the job runner API (e.g., "http://localhost:8000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new job runner client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use pipewatch_client::JobRunnerClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = JobRunnerClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the job runner
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body is not used
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
