//! Configuration: environment-backed project settings and the injected context.

pub mod connection;
pub mod context;

pub use connection::ConnectionString;
pub use context::ProjectContext;

use std::time::Duration;

use crate::error::{AgentLabError, Result};

/// Default agents REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-07-01-preview";
/// Default chat-completions API version.
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-05-01-preview";
/// Default interval between run status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Environment variable names read by [`ProjectConfig::from_env`].
pub mod env {
    pub const CONNECTION_STRING: &str = "PROJECT_CONNECTION_STRING";
    pub const MODEL_DEPLOYMENT_NAME: &str = "MODEL_DEPLOYMENT_NAME";
    pub const MODEL_NAME: &str = "MODEL_NAME";
    pub const OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    pub const SEARCH_CONNECTION_NAME: &str = "BING_CONNECTION_NAME";
    pub const API_VERSION: &str = "AGENTLAB_API_VERSION";
    pub const OPENAI_API_VERSION: &str = "AGENTLAB_OPENAI_API_VERSION";
    pub const POLL_INTERVAL_MS: &str = "AGENTLAB_POLL_INTERVAL_MS";
}

/// Settings for one agent project.
///
/// Values are only checked for presence, and only when something needs them:
/// a missing model deployment is reported when a session starts, a missing
/// chat endpoint when a chat client is built.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    connection_string: Option<String>,
    model_deployment: Option<String>,
    model_name: Option<String>,
    openai_endpoint: Option<String>,
    search_connection_name: Option<String>,
    api_version: String,
    openai_api_version: String,
    poll_interval: Duration,
    run_timeout: Option<Duration>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectConfig {
    /// Empty config with default API versions and poll interval.
    pub fn new() -> Self {
        Self {
            connection_string: None,
            model_deployment: None,
            model_name: None,
            openai_endpoint: None,
            search_connection_name: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            openai_api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            run_timeout: None,
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();

        config.connection_string = read_env(env::CONNECTION_STRING);
        config.model_deployment = read_env(env::MODEL_DEPLOYMENT_NAME);
        config.model_name = read_env(env::MODEL_NAME);
        config.openai_endpoint = read_env(env::OPENAI_ENDPOINT);
        config.search_connection_name = read_env(env::SEARCH_CONNECTION_NAME);

        if let Some(version) = read_env(env::API_VERSION) {
            config.api_version = version;
        }
        if let Some(version) = read_env(env::OPENAI_API_VERSION) {
            config.openai_api_version = version;
        }
        if let Some(ms) = read_env(env::POLL_INTERVAL_MS).and_then(|v| v.parse::<u64>().ok()) {
            config.poll_interval = Duration::from_millis(ms);
        }

        config
    }

    pub fn with_connection_string(mut self, value: impl Into<String>) -> Self {
        self.connection_string = Some(value.into());
        self
    }

    pub fn with_model_deployment(mut self, value: impl Into<String>) -> Self {
        self.model_deployment = Some(value.into());
        self
    }

    pub fn with_model_name(mut self, value: impl Into<String>) -> Self {
        self.model_name = Some(value.into());
        self
    }

    pub fn with_openai_endpoint(mut self, value: impl Into<String>) -> Self {
        self.openai_endpoint = Some(value.into());
        self
    }

    pub fn with_search_connection_name(mut self, value: impl Into<String>) -> Self {
        self.search_connection_name = Some(value.into());
        self
    }

    pub fn with_api_version(mut self, value: impl Into<String>) -> Self {
        self.api_version = value.into();
        self
    }

    pub fn with_openai_api_version(mut self, value: impl Into<String>) -> Self {
        self.openai_api_version = value.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the total time a session waits for a run.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Parsed project connection string.
    pub fn require_connection_string(&self) -> Result<ConnectionString> {
        require(&self.connection_string, env::CONNECTION_STRING)?.parse()
    }

    pub fn require_model_deployment(&self) -> Result<&str> {
        require(&self.model_deployment, env::MODEL_DEPLOYMENT_NAME)
    }

    /// Model name, falling back to the deployment name.
    pub fn model_name(&self) -> Option<&str> {
        self.model_name
            .as_deref()
            .or(self.model_deployment.as_deref())
    }

    pub fn require_openai_endpoint(&self) -> Result<&str> {
        require(&self.openai_endpoint, env::OPENAI_ENDPOINT)
    }

    pub fn require_search_connection_name(&self) -> Result<&str> {
        require(&self.search_connection_name, env::SEARCH_CONNECTION_NAME)
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn openai_api_version(&self) -> &str {
        &self.openai_api_version
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| AgentLabError::missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_name_the_variable() {
        let config = ProjectConfig::new();
        let err = config.require_model_deployment().unwrap_err();
        assert!(matches!(err, AgentLabError::Configuration(ref m) if m.contains("MODEL_DEPLOYMENT_NAME")));
        let err = config.require_connection_string().unwrap_err();
        assert!(err.to_string().contains("PROJECT_CONNECTION_STRING"));
    }

    #[test]
    fn model_name_falls_back_to_deployment() {
        let config = ProjectConfig::new().with_model_deployment("gpt-4o-deploy");
        assert_eq!(config.model_name(), Some("gpt-4o-deploy"));
        let config = config.with_model_name("gpt-4o");
        assert_eq!(config.model_name(), Some("gpt-4o"));
    }

    #[test]
    fn defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.api_version(), DEFAULT_API_VERSION);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.run_timeout().is_none());
    }
}
