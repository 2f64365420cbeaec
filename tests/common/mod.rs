//! Shared test helpers and an in-memory agent service.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use agentlab::auth::StaticCredential;
use agentlab::config::{ProjectConfig, ProjectContext};
use agentlab::error::{AgentLabError, Result};
use agentlab::service::AgentService;
use agentlab::types::*;

/// Scripted state behind [`MockAgentService`].
#[derive(Default)]
struct MockState {
    next_id: usize,
    /// Statuses handed out by successive `get_run` calls; the last one repeats.
    run_statuses: VecDeque<RunStatus>,
    last_status: Option<RunStatus>,
    last_error: Option<RunLastError>,
    messages: Vec<ThreadMessage>,
    posted: Vec<String>,
    file_contents: HashMap<String, Vec<u8>>,
    fail_on: Option<&'static str>,
    calls: Vec<String>,
    definitions: Vec<AgentDefinition>,
}

/// An in-memory [`AgentService`] that records every call.
#[derive(Default)]
pub struct MockAgentService {
    state: Mutex<MockState>,
}

impl MockAgentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses reported by successive polls. Defaults to `completed`.
    pub fn with_run_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.state.lock().unwrap().run_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_last_error(self, code: &str, message: &str) -> Self {
        self.state.lock().unwrap().last_error = Some(RunLastError {
            code: code.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Seed a message returned by `list_messages`.
    pub fn with_message(self, message: ThreadMessage) -> Self {
        self.state.lock().unwrap().messages.push(message);
        self
    }

    pub fn with_file_content(self, file_id: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .file_contents
            .insert(file_id.to_string(), content.to_vec());
        self
    }

    /// Make the named operation fail with an API error.
    pub fn fail_on(self, operation: &'static str) -> Self {
        self.state.lock().unwrap().fail_on = Some(operation);
        self
    }

    /// Every call, in order, as `operation` or `operation:id`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls to `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    /// Texts of user messages posted to threads.
    pub fn posted(&self) -> Vec<String> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn definitions(&self) -> Vec<AgentDefinition> {
        self.state.lock().unwrap().definitions.clone()
    }

    fn record(&self, operation: &'static str, id: Option<&str>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(match id {
            Some(id) => format!("{operation}:{id}"),
            None => operation.to_string(),
        });
        if state.fail_on == Some(operation) {
            return Err(AgentLabError::api(500, format!("{operation} failed")));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{prefix}_{}", state.next_id)
    }

    fn run(&self, thread_id: &str, status: RunStatus) -> Run {
        let last_error = self.state.lock().unwrap().last_error.clone();
        serde_json::from_value(json!({
            "id": "run_1",
            "thread_id": thread_id,
            "assistant_id": "asst_1",
            "status": status,
            "last_error": last_error,
            "created_at": 0
        }))
        .unwrap()
    }
}

#[async_trait]
impl AgentService for MockAgentService {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent> {
        self.record("create_agent", None)?;
        self.state.lock().unwrap().definitions.push(definition.clone());
        Ok(serde_json::from_value(json!({
            "id": self.next_id("asst"),
            "model": definition.model,
            "created_at": 0
        }))
        .unwrap())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.record("delete_agent", Some(agent_id))
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.record("create_thread", None)?;
        Ok(serde_json::from_value(json!({"id": self.next_id("thread"), "created_at": 0})).unwrap())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.record("delete_thread", Some(thread_id))
    }

    async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<ThreadMessage> {
        self.record("create_message", Some(thread_id))?;
        self.state.lock().unwrap().posted.push(message.content.clone());
        Ok(text_message("msg_user", MessageRole::User, &message.content, 0))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        self.record("list_messages", Some(thread_id))?;
        Ok(self.state.lock().unwrap().messages.clone())
    }

    async fn create_run(&self, thread_id: &str, _run: &NewRun) -> Result<Run> {
        self.record("create_run", Some(thread_id))?;
        Ok(self.run(thread_id, RunStatus::Queued))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.record("get_run", Some(run_id))?;
        let status = {
            let mut state = self.state.lock().unwrap();
            match state.run_statuses.pop_front() {
                Some(status) => {
                    state.last_status = Some(status);
                    status
                }
                None => state.last_status.unwrap_or(RunStatus::Completed),
            }
        };
        Ok(self.run(thread_id, status))
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.record("cancel_run", Some(run_id))?;
        Ok(self.run(thread_id, RunStatus::Cancelling))
    }

    async fn upload_file(&self, path: &Path, _purpose: FilePurpose) -> Result<AgentFile> {
        self.record("upload_file", None)?;
        Ok(serde_json::from_value(json!({
            "id": self.next_id("file"),
            "filename": path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            "bytes": 0,
            "created_at": 0
        }))
        .unwrap())
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.record("delete_file", Some(file_id))
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        self.record("file_content", Some(file_id))?;
        self.state
            .lock()
            .unwrap()
            .file_contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| AgentLabError::api(404, format!("no file {file_id}")))
    }

    async fn create_vector_store(&self, request: &NewVectorStore) -> Result<VectorStore> {
        self.record("create_vector_store", None)?;
        Ok(serde_json::from_value(json!({
            "id": self.next_id("vs"),
            "name": request.name,
            "status": "completed"
        }))
        .unwrap())
    }

    async fn get_vector_store(&self, vector_store_id: &str) -> Result<VectorStore> {
        self.record("get_vector_store", Some(vector_store_id))?;
        Ok(serde_json::from_value(json!({"id": vector_store_id, "status": "completed"})).unwrap())
    }

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<()> {
        self.record("delete_vector_store", Some(vector_store_id))
    }

    async fn get_connection(&self, name: &str) -> Result<Connection> {
        self.record("get_connection", Some(name))?;
        Ok(serde_json::from_value(json!({
            "id": format!("/connections/{name}"),
            "name": name
        }))
        .unwrap())
    }
}

/// A thread message with a single text part.
pub fn text_message(id: &str, role: MessageRole, text: &str, created_at: i64) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": id,
        "role": role,
        "content": [{"type": "text", "text": {"value": text, "annotations": []}}],
        "created_at": created_at
    }))
    .unwrap()
}

/// An assistant message whose text references a produced file.
pub fn message_with_file(id: &str, text: &str, sandbox_path: &str, file_id: &str) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": id,
        "role": "assistant",
        "content": [{"type": "text", "text": {
            "value": text,
            "annotations": [{
                "type": "file_path",
                "text": sandbox_path,
                "file_path": {"file_id": file_id}
            }]
        }}],
        "created_at": 10
    }))
    .unwrap()
}

/// Config with a model deployment and a fast poll interval.
pub fn test_config() -> ProjectConfig {
    ProjectConfig::new()
        .with_model_deployment("gpt-4o")
        .with_poll_interval(Duration::from_millis(1))
}

pub fn context_with(config: ProjectConfig, service: Arc<MockAgentService>) -> ProjectContext {
    ProjectContext::with_service(config, Arc::new(StaticCredential::new("test-token")), service)
}

/// Wait up to a second for `condition` to hold, yielding to spawned tasks.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
