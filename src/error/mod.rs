//! Error types for agentlab.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

use crate::types::{RunLastError, RunStatus};

/// Primary error type for service, configuration and tool operations.
#[derive(Error, Debug)]
pub enum AgentLabError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl AgentLabError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error naming a missing value.
    pub fn missing(name: &str) -> Self {
        Self::Configuration(format!("{name} is not set"))
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            _ => ErrorCategory::Unknown,
        }
    }
}

/// Outcome of a run that did not produce an answer.
///
/// Returned as a value from [`AgentSession::run`](crate::session::AgentSession::run);
/// callers branch on it explicitly. Cleanup has already happened by the time
/// a caller sees one of these.
#[derive(Error, Debug)]
pub enum RunError {
    /// The remote run reached the `failed` terminal state.
    #[error("Run failed: {}", display_last_error(.last_error))]
    Failed { last_error: Option<RunLastError> },

    /// The remote run ended in a terminal state other than `completed` or `failed`.
    #[error("Run ended with status {status}: {}", display_last_error(.last_error))]
    Ended {
        status: RunStatus,
        last_error: Option<RunLastError>,
    },

    #[error("Run cancelled")]
    Cancelled,

    /// The run completed but the thread holds no assistant message.
    #[error("No response from the agent")]
    NoResponse,

    #[error(transparent)]
    Service(#[from] AgentLabError),
}

impl RunError {
    /// Message of the remote last error, if the run reported one.
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Self::Failed { last_error } | Self::Ended { last_error, .. } => {
                last_error.as_ref().map(|e| e.message.as_str())
            }
            _ => None,
        }
    }
}

fn display_last_error(last_error: &Option<RunLastError>) -> String {
    match last_error {
        Some(err) => err.to_string(),
        None => "no error reported".to_string(),
    }
}

/// A remote resource that could not be released.
///
/// Logged by the session, never returned to the caller.
#[derive(Error, Debug)]
#[error("Failed to delete {resource} {id}: {source}")]
pub struct ResourceCleanupError {
    pub resource: &'static str,
    pub id: String,
    #[source]
    pub source: AgentLabError,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentLabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(
            AgentLabError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AgentLabError::api(404, "gone").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            AgentLabError::api(503, "busy").category(),
            ErrorCategory::Server
        );
        assert_eq!(AgentLabError::api(400, "bad").category(), ErrorCategory::Api);
    }

    #[test]
    fn run_error_exposes_last_error_message() {
        let err = RunError::Failed {
            last_error: Some(RunLastError {
                code: "server_error".to_string(),
                message: "X".to_string(),
            }),
        };
        assert_eq!(err.last_error(), Some("X"));
        assert_eq!(err.to_string(), "Run failed: server_error: X");
        assert_eq!(RunError::Cancelled.last_error(), None);
    }
}
