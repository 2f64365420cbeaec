//! REST implementation of [`AgentService`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::AgentService;
use crate::auth::{CredentialProvider, AGENTS_SCOPE};
use crate::error::{AgentLabError, Result};
use crate::types::{
    Agent, AgentDefinition, AgentFile, Connection, DeletionStatus, FilePurpose, ListResponse,
    NewMessage, NewRun, NewVectorStore, Run, Thread, ThreadMessage, VectorStore,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_SIZE: &str = "100";

/// Build default headers for a bearer-token API.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> AgentLabError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => AgentLabError::Authentication(message),
        _ => AgentLabError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
}

/// Agent service client for a single project.
pub struct HttpAgentService {
    client: reqwest::Client,
    agents_endpoint: String,
    connections_endpoint: String,
    api_version: String,
    credential: Arc<dyn CredentialProvider>,
}

impl HttpAgentService {
    pub fn new(
        agents_endpoint: impl Into<String>,
        connections_endpoint: impl Into<String>,
        api_version: impl Into<String>,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            agents_endpoint: agents_endpoint.into().trim_end_matches('/').to_string(),
            connections_endpoint: connections_endpoint.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            credential,
        })
    }

    async fn request(&self, method: Method, url: String) -> Result<RequestBuilder> {
        let token = self.credential.token(AGENTS_SCOPE).await?;
        Ok(self
            .client
            .request(method, url)
            .headers(bearer_headers(&token.token))
            .header("x-ms-client-request-id", uuid::Uuid::new_v4().to_string())
            .query(&[("api-version", self.api_version.as_str())]))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.agents_endpoint, path)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = check(builder.send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "agent service GET");
        let builder = self.request(Method::GET, self.url(path)).await?;
        self.send(builder).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "agent service POST");
        let builder = self.request(Method::POST, self.url(path)).await?.json(body);
        self.send(builder).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "agent service DELETE");
        let builder = self.request(Method::DELETE, self.url(path)).await?;
        let status: DeletionStatus = self.send(builder).await?;
        if status.deleted {
            Ok(())
        } else {
            Err(AgentLabError::InvalidState(format!(
                "service declined to delete {}",
                status.id
            )))
        }
    }
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), &body))
}

#[async_trait]
impl AgentService for HttpAgentService {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent> {
        self.post("assistants", definition).await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.delete(&format!("assistants/{agent_id}")).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.post("threads", &serde_json::json!({})).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.delete(&format!("threads/{thread_id}")).await
    }

    async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<ThreadMessage> {
        self.post(&format!("threads/{thread_id}/messages"), message)
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let path = format!("threads/{thread_id}/messages");
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            debug!(path, after = ?after, "agent service GET");
            let mut builder = self
                .request(Method::GET, self.url(&path))
                .await?
                .query(&[("order", "asc"), ("limit", PAGE_SIZE)]);
            if let Some(cursor) = &after {
                builder = builder.query(&[("after", cursor.as_str())]);
            }
            let page: ListResponse<ThreadMessage> = self.send(builder).await?;
            let has_more = page.has_more && page.last_id.is_some();
            after = page.last_id;
            messages.extend(page.data);
            if !has_more {
                break;
            }
        }

        Ok(messages)
    }

    async fn create_run(&self, thread_id: &str, run: &NewRun) -> Result<Run> {
        self.post(&format!("threads/{thread_id}/runs"), run).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get(&format!("threads/{thread_id}/runs/{run_id}")).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.post(
            &format!("threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> Result<AgentFile> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AgentLabError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;
        debug!(file = %path.display(), size = bytes.len(), "agent service upload");

        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(filename));

        let token = self.credential.token(AGENTS_SCOPE).await?;
        let builder = self
            .client
            .post(self.url("files"))
            .bearer_auth(&token.token)
            .query(&[("api-version", self.api_version.as_str())])
            .multipart(form);
        self.send(builder).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.delete(&format!("files/{file_id}")).await
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        debug!(file_id, "agent service download");
        let builder = self
            .request(Method::GET, self.url(&format!("files/{file_id}/content")))
            .await?;
        let resp = check(builder.send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn create_vector_store(&self, request: &NewVectorStore) -> Result<VectorStore> {
        self.post("vector_stores", request).await
    }

    async fn get_vector_store(&self, vector_store_id: &str) -> Result<VectorStore> {
        self.get(&format!("vector_stores/{vector_store_id}")).await
    }

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<()> {
        self.delete(&format!("vector_stores/{vector_store_id}"))
            .await
    }

    async fn get_connection(&self, name: &str) -> Result<Connection> {
        let url = format!("{}/connections/{name}", self.connections_endpoint);
        debug!(connection = name, "agent service connection lookup");
        let builder = self.request(Method::GET, url).await?;
        self.send(builder).await
    }
}
