//! Runs: one execution of an agent against a thread.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::usage::Usage;

/// Status reported by the service for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    Incomplete,
}

impl RunStatus {
    /// Whether the service will not move the run out of this status.
    ///
    /// `requires_action` counts as terminal: sessions never submit tool
    /// outputs, so a run waiting on them cannot progress.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }
}

/// Error the service attached to a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunLastError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for RunLastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Request body for starting a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRun {
    #[serde(rename = "assistant_id")]
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
}

/// A run as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(rename = "assistant_id", alias = "agent_id")]
    pub agent_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunLastError>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub created_at: i64,
}
