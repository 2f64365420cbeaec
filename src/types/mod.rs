//! Data model of the agent-hosting service.
//!
//! Every structure here is owned by the remote service; these are the
//! request and response shapes the client sends and reads.

pub mod agent;
pub mod file;
pub mod message;
pub mod run;
pub mod usage;

pub use agent::*;
pub use file::*;
pub use message::*;
pub use run::*;
pub use usage::*;

use serde::{Deserialize, Serialize};

/// Paged list envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Acknowledgement returned by delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}
