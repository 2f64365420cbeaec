//! Agent sessions: one task, one remote agent, one run.
//!
//! A session is started from a [`ProjectContext`], which provisions the
//! agent, its tool resources and a thread holding the task. [`AgentSession::run`]
//! consumes the session, waits for the run to finish, extracts the most
//! recent assistant message and releases every remote resource before it
//! returns, whatever the outcome.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentlab::auth::ChainedCredential;
//! use agentlab::config::{ProjectConfig, ProjectContext};
//! use agentlab::session::{AgentSession, SessionSpec};
//! use agentlab::tools::ToolCapability;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = ProjectContext::connect(
//!     ProjectConfig::from_env(),
//!     Arc::new(ChainedCredential::default_chain()),
//! )?;
//! let spec = SessionSpec::new("What is GraphRAG?")
//!     .with_capability(ToolCapability::file_search(["./data/intro_rag.md"]));
//! match AgentSession::start(&context, spec).await?.run().await {
//!     Ok(answer) => println!("{}", answer.text),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod guard;
pub mod poll;

pub use guard::{ResourceGuard, SessionResources};

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AGENTS_SCOPE;
use crate::config::ProjectContext;
use crate::error::{AgentLabError, Result, RunError};
use crate::tools::ToolCapability;
use crate::types::{
    latest_assistant_message, AgentDefinition, FilePathAnnotation, FilePurpose,
    FileSearchResource, NewMessage, NewRun, NewVectorStore, RunStatus, ToolDefinition,
    ToolResources, Usage,
};
use crate::util::timeout::with_timeout;

/// Default instructions for session agents.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful agent";

/// What a session should do and with which tools.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSpec {
    pub task: String,
    pub instructions: String,
    pub agent_name: Option<String>,
    pub capabilities: Vec<ToolCapability>,
    /// Where to save files referenced by the answer; nothing is saved when unset.
    pub artifact_dir: Option<PathBuf>,
}

impl SessionSpec {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            agent_name: None,
            capabilities: Vec::new(),
            artifact_dir: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    pub fn with_capability(mut self, capability: ToolCapability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = ToolCapability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }
}

/// The agent's final answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Text of the most recent assistant message.
    pub text: String,
    pub message_id: String,
    pub run_id: String,
    pub annotations: Vec<FilePathAnnotation>,
    /// Local paths of artifacts that were saved, in annotation order.
    /// Files that could not be downloaded or written are logged and left out.
    pub saved_files: Vec<PathBuf>,
    pub usage: Option<Usage>,
}

/// A provisioned session, ready to run.
pub struct AgentSession {
    context: ProjectContext,
    agent_id: String,
    thread_id: String,
    artifact_dir: Option<PathBuf>,
    guard: ResourceGuard,
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("agent_id", &self.agent_id)
            .field("thread_id", &self.thread_id)
            .field("resources", &self.guard.resources())
            .finish()
    }
}

/// Connection names each web-search capability resolves to, checked before
/// any remote call is made.
fn connection_names<'a>(context: &'a ProjectContext, spec: &'a SessionSpec) -> Result<Vec<&'a str>> {
    spec.capabilities
        .iter()
        .filter_map(|capability| match capability {
            ToolCapability::WebSearch { connection_name } => Some(connection_name),
            _ => None,
        })
        .map(|name| match name {
            Some(name) => Ok(name.as_str()),
            None => context.config().require_search_connection_name(),
        })
        .collect()
}

impl AgentSession {
    /// Provision the agent, its tool resources and a thread holding the task.
    ///
    /// Configuration problems (missing model deployment, missing search
    /// connection name, no credential) are reported before anything is
    /// created. If provisioning fails part way, what was already created is
    /// released before the error is returned.
    pub async fn start(context: &ProjectContext, spec: SessionSpec) -> Result<Self> {
        let model = context.config().require_model_deployment()?.to_string();
        let connections = connection_names(context, &spec)?;
        context
            .credential()
            .token(AGENTS_SCOPE)
            .await
            .map_err(|e| AgentLabError::Configuration(format!("credential unavailable: {e}")))?;

        let mut guard = ResourceGuard::new(context.service().clone());
        match provision(context, &spec, &model, &connections, &mut guard).await {
            Ok((agent_id, thread_id)) => {
                info!(agent_id = %agent_id, thread_id = %thread_id, "session started");
                Ok(Self {
                    context: context.clone(),
                    agent_id,
                    thread_id,
                    artifact_dir: spec.artifact_dir,
                    guard,
                })
            }
            Err(err) => {
                warn!(error = %err, "session start failed; releasing partial resources");
                guard.release().await;
                Err(err)
            }
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Run the task to completion, then clean up.
    pub async fn run(self) -> std::result::Result<Answer, RunError> {
        self.run_until_cancelled(CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops early when `cancel` fires.
    ///
    /// A cancelled run is cancelled remotely (best effort) and the session is
    /// still cleaned up before `RunError::Cancelled` is returned.
    pub async fn run_until_cancelled(
        mut self,
        cancel: CancellationToken,
    ) -> std::result::Result<Answer, RunError> {
        let outcome = self.execute(&cancel).await;
        if let Err(err) = &outcome {
            info!(error = %err, "run did not produce an answer");
        }
        self.guard.release().await;
        outcome
    }

    /// Release every remote resource without running.
    pub async fn cleanup(mut self) {
        self.guard.release().await;
    }

    async fn execute(&self, cancel: &CancellationToken) -> std::result::Result<Answer, RunError> {
        let service = self.context.service().clone();
        let config = self.context.config();

        let run = service
            .create_run(
                &self.thread_id,
                &NewRun {
                    agent_id: self.agent_id.clone(),
                    additional_instructions: None,
                },
            )
            .await?;
        let run_id = run.id.clone();
        debug!(run_id = %run_id, status = %run.status, "run created");

        let wait = poll::wait_for_run(service.as_ref(), run, config.poll_interval());
        let wait = async {
            match config.run_timeout() {
                Some(limit) => with_timeout(limit, wait).await,
                None => wait.await,
            }
        };

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentLabError::Cancelled),
            result = wait => result,
        };

        let run = match waited {
            Ok(run) => run,
            Err(err) => {
                if matches!(err, AgentLabError::Cancelled | AgentLabError::Timeout(_)) {
                    if let Err(cancel_err) = service.cancel_run(&self.thread_id, &run_id).await {
                        warn!(run_id = %run_id, error = %cancel_err, "remote cancel failed");
                    }
                }
                return Err(match err {
                    AgentLabError::Cancelled => RunError::Cancelled,
                    other => RunError::Service(other),
                });
            }
        };
        info!(run_id = %run.id, status = %run.status, "run finished");

        match run.status {
            RunStatus::Completed => {}
            RunStatus::Failed => {
                return Err(RunError::Failed {
                    last_error: run.last_error,
                })
            }
            status => {
                return Err(RunError::Ended {
                    status,
                    last_error: run.last_error,
                })
            }
        }

        let messages = service.list_messages(&self.thread_id).await?;
        let message = latest_assistant_message(&messages).ok_or(RunError::NoResponse)?;
        let annotations = message.file_path_annotations();

        let saved_files = match &self.artifact_dir {
            Some(dir) => artifacts::save_artifacts(service.as_ref(), &annotations, dir).await,
            None => Vec::new(),
        };

        Ok(Answer {
            text: message.text(),
            message_id: message.id.clone(),
            run_id: run.id,
            annotations,
            saved_files,
            usage: run.usage,
        })
    }
}

async fn provision(
    context: &ProjectContext,
    spec: &SessionSpec,
    model: &str,
    connections: &[&str],
    guard: &mut ResourceGuard,
) -> Result<(String, String)> {
    let service = context.service().clone();
    let interval = context.config().poll_interval();

    let mut tools = Vec::new();
    let mut vector_store_ids = Vec::new();
    let mut connections = connections.iter();

    for capability in &spec.capabilities {
        debug!(capability = capability.label(), "resolving capability");
        match capability {
            ToolCapability::CodeInterpreter => push_unique(&mut tools, ToolDefinition::CodeInterpreter),
            ToolCapability::FileSearch { files, store_name } => {
                let mut file_ids = Vec::with_capacity(files.len());
                for path in files {
                    let file = service.upload_file(path, FilePurpose::Assistants).await?;
                    guard.track(|r| r.file_ids.push(file.id.clone()));
                    file_ids.push(file.id);
                }
                let store = service
                    .create_vector_store(&NewVectorStore {
                        name: store_name.clone(),
                        file_ids,
                    })
                    .await?;
                guard.track(|r| r.vector_store_ids.push(store.id.clone()));
                let store = poll::wait_for_vector_store(service.as_ref(), store, interval).await?;
                info!(vector_store_id = %store.id, "created vector store");
                vector_store_ids.push(store.id);
                push_unique(&mut tools, ToolDefinition::FileSearch);
            }
            ToolCapability::ExistingVectorStores { vector_store_ids: ids } => {
                vector_store_ids.extend(ids.iter().cloned());
                push_unique(&mut tools, ToolDefinition::FileSearch);
            }
            ToolCapability::WebSearch { .. } => {
                let name = connections.next().ok_or_else(|| {
                    AgentLabError::InvalidState("web search connection not resolved".to_string())
                })?;
                let connection = service.get_connection(name).await?;
                push_unique(&mut tools, ToolDefinition::bing_grounding(connection.id));
            }
        }
    }

    let tool_resources = (!vector_store_ids.is_empty()).then(|| ToolResources {
        file_search: Some(FileSearchResource { vector_store_ids }),
        ..Default::default()
    });

    let definition = AgentDefinition::builder()
        .model(model)
        .maybe_name(spec.agent_name.clone())
        .instructions(spec.instructions.clone())
        .tools(tools)
        .maybe_tool_resources(tool_resources)
        .build();

    let agent = service.create_agent(&definition).await?;
    guard.track(|r| r.agent_id = Some(agent.id.clone()));

    let thread = service.create_thread().await?;
    guard.track(|r| r.thread_id = Some(thread.id.clone()));

    service
        .create_message(&thread.id, &NewMessage::user(spec.task.clone()))
        .await?;

    Ok((agent.id, thread.id))
}

fn push_unique(tools: &mut Vec<ToolDefinition>, tool: ToolDefinition) {
    if !tools.contains(&tool) {
        tools.push(tool);
    }
}
