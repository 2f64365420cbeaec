//! The agent-hosting service boundary.

pub mod http;

pub use http::HttpAgentService;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Agent, AgentDefinition, AgentFile, Connection, FilePurpose, NewMessage, NewRun, NewVectorStore,
    Run, Thread, ThreadMessage, VectorStore,
};

/// Operations a session needs from the remote agent service.
///
/// Implemented over HTTP by [`HttpAgentService`]; tests substitute an
/// in-memory double.
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent>;
    async fn delete_agent(&self, agent_id: &str) -> Result<()>;

    async fn create_thread(&self) -> Result<Thread>;
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<ThreadMessage>;
    /// Messages on the thread, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    async fn create_run(&self, thread_id: &str, run: &NewRun) -> Result<Run>;
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> Result<AgentFile>;
    async fn delete_file(&self, file_id: &str) -> Result<()>;
    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>>;

    async fn create_vector_store(&self, request: &NewVectorStore) -> Result<VectorStore>;
    async fn get_vector_store(&self, vector_store_id: &str) -> Result<VectorStore>;
    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<()>;

    /// Resolve a project connection by name.
    async fn get_connection(&self, name: &str) -> Result<Connection>;
}
