//! Chat agents: a system message, a chat model and local tools.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::ChatModel;
use super::message::{ChatMessage, ChatToolCall};
use crate::error::{AgentLabError, Result};
use crate::team::{Participant, TeamMessage, USER_SOURCE};
use crate::tools::validation::validate_arguments;
use crate::tools::Tool;
use crate::types::{FunctionDefinition, Usage};

/// Default cap on model calls per turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// A team participant backed by a chat deployment.
///
/// Each turn calls the model, runs any requested tools and feeds their
/// results back until the model answers in text.
pub struct ChatAgent {
    name: String,
    system_message: String,
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    max_tool_iterations: usize,
    usage: Mutex<Usage>,
}

impl ChatAgent {
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            system_message: system_message.into(),
            model,
            tools: Vec::new(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            usage: Mutex::new(Usage::default()),
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Tokens used by every model call this agent has made.
    pub fn usage(&self) -> Usage {
        self.usage.lock().map(|u| *u).unwrap_or_default()
    }

    fn record_usage(&self, usage: &Usage) {
        if let Ok(mut total) = self.usage.lock() {
            total.merge(usage);
        }
    }

    /// Conversation as seen by this agent: its own messages are assistant
    /// turns, everyone else's are named user turns.
    fn conversation(&self, transcript: &[TeamMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(self.system_message.clone()));
        for entry in transcript {
            let message = if entry.source == self.name {
                ChatMessage::assistant(entry.content.clone())
            } else if entry.source == USER_SOURCE {
                ChatMessage::user(entry.content.clone())
            } else {
                ChatMessage::user(entry.content.clone()).with_name(&entry.source)
            };
            messages.push(message);
        }
        messages
    }

    async fn call_tool(&self, call: &ChatToolCall) -> Value {
        let name = call.function.name.as_str();
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!(agent = %self.name, tool = name, "Tool not found");
            return serde_json::json!({"error": format!("Tool '{name}' not found")});
        };

        let outcome = match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(args) => match validate_arguments(name, &args, &tool.parameters().schema) {
                Ok(()) => tool.execute(&args).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(AgentLabError::ToolExecution {
                tool_name: name.to_string(),
                message: format!("arguments are not valid JSON: {e}"),
            }),
        };

        match outcome {
            Ok(value) => value,
            Err(e) => {
                warn!(agent = %self.name, tool = name, error = %e, "Tool execution failed");
                serde_json::json!({"error": e.to_string()})
            }
        }
    }
}

fn tool_output(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl Participant for ChatAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, transcript: &[TeamMessage]) -> Result<String> {
        let mut messages = self.conversation(transcript);
        let definitions: Vec<FunctionDefinition> = self.tools.iter().map(|t| t.definition()).collect();

        for iteration in 0..self.max_tool_iterations {
            debug!(agent = %self.name, iteration, "chat agent: calling model");
            let completion = self.model.complete(&messages, &definitions).await?;
            self.record_usage(&completion.usage);
            let reply = completion.message;

            if reply.tool_calls.is_empty() {
                return Ok(reply.content.unwrap_or_default());
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let output = self.call_tool(call).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), tool_output(output)));
            }
        }

        Err(AgentLabError::InvalidState(format!(
            "agent {} exceeded {} tool iterations without answering",
            self.name, self.max_tool_iterations
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::client::ChatCompletion;
    use crate::chat::message::FunctionCall;
    use crate::tools::{FnTool, ToolParameters};
    use std::collections::VecDeque;

    struct ScriptedModel {
        replies: Mutex<VecDeque<ChatMessage>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ChatMessage>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[FunctionDefinition],
        ) -> Result<ChatCompletion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| tool_call("again", "{}"));
            Ok(ChatCompletion {
                message,
                finish_reason: None,
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 2,
                    total_tokens: 12,
                },
            })
        }
    }

    fn tool_call(name: &str, arguments: &str) -> ChatMessage {
        ChatMessage {
            tool_calls: vec![ChatToolCall {
                id: format!("call_{name}"),
                kind: "function".into(),
                function: FunctionCall {
                    name: name.into(),
                    arguments: arguments.into(),
                },
            }],
            content: None,
            ..ChatMessage::assistant("")
        }
    }

    fn adder() -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            "add",
            "Add two numbers",
            ToolParameters::object()
                .number("a", "first", true)
                .number("b", "second", true)
                .build(),
            |args| async move {
                let a = args["a"].as_f64().unwrap_or_default();
                let b = args["b"].as_f64().unwrap_or_default();
                Ok(serde_json::json!(a + b))
            },
        ))
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("add", r#"{"a": 2, "b": 3}"#),
            ChatMessage::assistant("The sum is 5"),
        ]));
        let agent = ChatAgent::new("writer", "You write.", model.clone()).with_tool(adder());

        let reply = agent
            .respond(&[TeamMessage::new(USER_SOURCE, "add 2 and 3")])
            .await
            .unwrap();
        assert_eq!(reply, "The sum is 5");

        let seen = model.seen.lock().unwrap();
        let last = seen[1].last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("call_add"));
        assert_eq!(last.content.as_deref(), Some("5.0"));
    }

    #[tokio::test]
    async fn usage_accumulates_across_turns() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("add", r#"{"a": 1, "b": 1}"#),
            ChatMessage::assistant("2"),
            ChatMessage::assistant("done"),
        ]));
        let agent = ChatAgent::new("writer", "You write.", model).with_tool(adder());

        agent.respond(&[TeamMessage::new(USER_SOURCE, "add")]).await.unwrap();
        assert_eq!(agent.usage().total_tokens, 24);

        agent.respond(&[TeamMessage::new(USER_SOURCE, "again")]).await.unwrap();
        let usage = agent.usage();
        assert_eq!(usage.input_tokens, 30);
        assert_eq!(usage.output_tokens, 6);
        assert_eq!(usage.total_tokens, 36);
    }

    #[tokio::test]
    async fn invalid_arguments_become_error_results() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("add", r#"{"a": 2}"#),
            ChatMessage::assistant("sorry"),
        ]));
        let agent = ChatAgent::new("writer", "You write.", model.clone()).with_tool(adder());

        agent.respond(&[TeamMessage::new(USER_SOURCE, "add")]).await.unwrap();

        let seen = model.seen.lock().unwrap();
        let result = seen[1].last().unwrap().content.clone().unwrap();
        assert!(result.contains("error"), "{result}");
    }

    #[tokio::test]
    async fn tool_loop_is_bounded() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let agent = ChatAgent::new("writer", "You write.", model).with_max_tool_iterations(3);

        let err = agent
            .respond(&[TeamMessage::new(USER_SOURCE, "loop")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentLabError::InvalidState(_)));
    }

    #[test]
    fn other_participants_are_named_user_turns() {
        let agent = ChatAgent::new("reviewer", "You review.", Arc::new(ScriptedModel::new(vec![])));
        let messages = agent.conversation(&[
            TeamMessage::new(USER_SOURCE, "task"),
            TeamMessage::new("writer", "draft"),
            TeamMessage::new("reviewer", "notes"),
        ]);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].name.as_deref(), Some("writer"));
        assert_eq!(messages[3].role, crate::chat::ChatRole::Assistant);
    }
}
