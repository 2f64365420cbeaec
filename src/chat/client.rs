//! Azure OpenAI chat-completions client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::ChatMessage;
use crate::auth::{CredentialProvider, COGNITIVE_SERVICES_SCOPE};
use crate::config::ProjectContext;
use crate::error::{AgentLabError, Result};
use crate::service::http::{bearer_headers, status_to_error};
use crate::types::{FunctionDefinition, Usage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// One model turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub message: ChatMessage,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}

/// Something that can complete a chat conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionDefinition],
    ) -> Result<ChatCompletion>;
}

/// Client for one chat deployment.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    model: Option<String>,
    credential: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatClient {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            model: None,
            credential,
        })
    }

    /// Client for the project's chat endpoint and model deployment.
    pub fn from_context(context: &ProjectContext) -> Result<Self> {
        let config = context.config();
        let client = Self::new(
            config.require_openai_endpoint()?,
            config.require_model_deployment()?,
            config.openai_api_version(),
            context.credential().clone(),
        )?;
        Ok(client.with_model(config.model_name()))
    }

    /// Model name sent with each request, alongside the deployment in the URL.
    pub fn with_model(mut self, model: Option<impl Into<String>>) -> Self {
        self.model = model.map(Into::into);
        self
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionDefinition,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionDefinition],
    ) -> Result<ChatCompletion> {
        let body = CompletionRequest {
            model: self.model.as_deref(),
            messages,
            tools: tools
                .iter()
                .map(|function| ToolSpec {
                    kind: "function",
                    function,
                })
                .collect(),
        };

        debug!(
            deployment = %self.deployment,
            messages = messages.len(),
            tools = tools.len(),
            "chat completion"
        );

        let token = self.credential.token(COGNITIVE_SERVICES_SCOPE).await?;
        let resp = self
            .client
            .post(self.url())
            .headers(bearer_headers(&token.token))
            .query(&[("api-version", self.api_version.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }

        let data: CompletionResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentLabError::api(200, "No choices in chat completion response"))?;

        Ok(ChatCompletion {
            message: choice.message,
            finish_reason: choice.finish_reason.as_deref().and_then(|s| s.parse().ok()),
            usage: data.usage.unwrap_or_default(),
        })
    }
}
