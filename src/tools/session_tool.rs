//! A function tool whose every call is a nested agent session.

use async_trait::async_trait;
use tracing::info;

use super::capability::ToolCapability;
use super::tool::Tool;
use super::types::ToolParameters;
use crate::config::ProjectContext;
use crate::error::AgentLabError;
use crate::session::{AgentSession, SessionSpec};

const QUERY_ARG: &str = "query";

const WEB_SEARCH_INSTRUCTIONS: &str = "You are a web search agent. \
Your only tool is search_tool - use it to find information. \
You make only one search call at a time. \
Once you have the results, you never do calculations based on them.";

/// Runs `template` with the call's `query` argument as the task.
///
/// Each call provisions its own agent and thread and releases them before
/// returning.
pub struct SessionTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    context: ProjectContext,
    template: SessionSpec,
}

impl SessionTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        context: ProjectContext,
        template: SessionSpec,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters::object()
                .string(QUERY_ARG, "What to ask the agent", true)
                .build(),
            context,
            template,
        }
    }

    /// Web search agent grounded through the configured search connection.
    pub fn web_search(context: ProjectContext) -> Self {
        let template = SessionSpec::new(String::new())
            .with_agent_name("web-search-agent")
            .with_instructions(WEB_SEARCH_INSTRUCTIONS)
            .with_capability(ToolCapability::web_search());
        Self::new(
            "web_search",
            "Search the web and return what was found",
            context,
            template,
        )
    }
}

#[async_trait]
impl Tool for SessionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<serde_json::Value, AgentLabError> {
        let query = args
            .get(QUERY_ARG)
            .and_then(|q| q.as_str())
            .ok_or_else(|| AgentLabError::ToolExecution {
                tool_name: self.name.clone(),
                message: format!("missing '{QUERY_ARG}' argument"),
            })?;
        info!(tool = %self.name, query, "running nested session");

        let mut spec = self.template.clone();
        spec.task = query.to_string();

        let session = AgentSession::start(&self.context, spec)
            .await
            .map_err(|err| self.failure(err))?;
        match session.run().await {
            Ok(answer) => Ok(serde_json::Value::String(answer.text)),
            Err(err) => Err(self.failure(err)),
        }
    }
}

impl SessionTool {
    fn failure(&self, err: impl std::fmt::Display) -> AgentLabError {
        AgentLabError::ToolExecution {
            tool_name: self.name.clone(),
            message: err.to_string(),
        }
    }
}
