//! Uploaded files and vector stores.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Intended use of an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilePurpose {
    Assistants,
    AssistantsOutput,
}

/// A file held by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentFile {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub created_at: i64,
}

/// Request body for creating a vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVectorStore {
    pub name: String,
    pub file_ids: Vec<String>,
}

/// A searchable index over uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
