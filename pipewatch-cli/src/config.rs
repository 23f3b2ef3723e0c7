//! Configuration module
//!
//! Handles CLI configuration: job runner connection, ticket links and
//! polling behaviour.

use anyhow::Result;
use pipewatch_sync::SyncConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the job runner
    pub runner_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// JIRA base URL for ticket links
    pub jira_url: Option<String>,

    /// Poll period and retry budget
    pub sync: SyncConfig,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.runner_url.starts_with("http://") && !self.runner_url.starts_with("https://") {
            anyhow::bail!("runner_url must start with http:// or https://");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        self.sync.validate()?;

        Ok(())
    }

    /// Browse link for a ticket, if a JIRA base URL is configured
    pub fn ticket_link(&self, ticket: &str) -> Option<String> {
        self.jira_url
            .as_deref()
            .map(|base| format!("{}/browse/{}", base.trim_end_matches('/'), ticket))
    }
}
