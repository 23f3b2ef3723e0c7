//! Error types for the job runner client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the job runner
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response (connection refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The runner answered with a non-success status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Coarse failure class used for propagation decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level failure reaching the runner
    Network,
    /// The runner answered, but not with what the contract promises
    Protocol,
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RequestFailed(e) if e.is_decode() => FailureKind::Protocol,
            Self::RequestFailed(_) => FailureKind::Network,
            Self::ApiError { .. } | Self::ParseError(_) => FailureKind::Protocol,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind() == FailureKind::Network
    }
}
