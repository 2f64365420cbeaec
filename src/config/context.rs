//! The context object every session is started from.

use std::sync::Arc;

use crate::auth::CredentialProvider;
use crate::error::Result;
use crate::service::{AgentService, HttpAgentService};

use super::ProjectConfig;

/// Configuration plus the service and credential it resolved to.
///
/// Built once and shared (it is cheap to clone); sessions never construct
/// their own clients.
#[derive(Clone)]
pub struct ProjectContext {
    config: Arc<ProjectConfig>,
    credential: Arc<dyn CredentialProvider>,
    service: Arc<dyn AgentService>,
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("config", &self.config)
            .field("credential", &self.credential.name())
            .finish()
    }
}

impl ProjectContext {
    /// Build the HTTP service for the configured project.
    ///
    /// Fails with a configuration error when the connection string is absent
    /// or malformed, and with a network error when the HTTP client cannot be built.
    pub fn connect(config: ProjectConfig, credential: Arc<dyn CredentialProvider>) -> Result<Self> {
        let connection = config.require_connection_string()?;
        let service = HttpAgentService::new(
            connection.agents_endpoint(),
            connection.connections_endpoint(),
            config.api_version(),
            credential.clone(),
        )?;
        Ok(Self {
            config: Arc::new(config),
            credential,
            service: Arc::new(service),
        })
    }

    /// Use an existing service implementation.
    pub fn with_service(
        config: ProjectConfig,
        credential: Arc<dyn CredentialProvider>,
        service: Arc<dyn AgentService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            credential,
            service,
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn credential(&self) -> &Arc<dyn CredentialProvider> {
        &self.credential
    }

    pub fn service(&self) -> &Arc<dyn AgentService> {
        &self.service
    }
}
