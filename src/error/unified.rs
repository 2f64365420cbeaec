//! Error classification.

/// Broad error category for routing handling logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    Timeout,
    RateLimit,
    NotFound,
    Server,
    Api,
    Serialization,
    ToolExecution,
    Cancelled,
    Unknown,
}
