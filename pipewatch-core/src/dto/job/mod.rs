//! Job DTOs returned by the job runner

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobOutcome, JobStatus};
use crate::domain::log::LogEntry;
use crate::domain::result::AnalysisResult;

/// Body of `GET /api/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    pub current_step: u8,
}

/// Body of `GET /api/logs`, the full log of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// Body of `GET /api/result`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultResponse {
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub jira_ticket: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<ResultResponse> for JobOutcome {
    fn from(response: ResultResponse) -> Self {
        Self {
            result: response.result,
            jira_ticket: response.jira_ticket,
            error: response.error,
        }
    }
}
