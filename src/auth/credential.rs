//! Credential provider trait and implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::token::AccessToken;
use crate::error::{AgentLabError, Result};

/// Env var read by [`EnvCredential::default`].
pub const ACCESS_TOKEN_ENV: &str = "AGENTLAB_ACCESS_TOKEN";

/// Supplies bearer credentials for a scope.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Obtain a token for `scope`.
    async fn token(&self, scope: &str) -> Result<AccessToken>;
}

/// A fixed token, regardless of scope.
#[derive(Clone)]
pub struct StaticCredential {
    token: AccessToken,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    fn name(&self) -> &str {
        "static"
    }

    async fn token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Reads a token from an environment variable at request time.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    fn name(&self) -> &str {
        "environment"
    }

    async fn token(&self, _scope: &str) -> Result<AccessToken> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(AccessToken::new(token.trim())),
            _ => Err(AgentLabError::missing(&self.var)),
        }
    }
}

/// Asks the Azure CLI for a token (`az account get-access-token`).
#[derive(Debug, Clone, Default)]
pub struct AzureCliCredential;

const AZ_PROGRAM: &str = "az";

impl AzureCliCredential {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct CliToken {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default)]
    expires_on: Option<i64>,
}

/// `az` takes a resource rather than a `/.default` scope.
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken> {
    let parsed: CliToken = serde_json::from_slice(stdout)?;
    let token = AccessToken::new(parsed.access_token);
    Ok(match parsed.expires_on.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)) {
        Some(expires_at) => token.with_expiry(expires_at),
        None => token,
    })
}

#[async_trait]
impl CredentialProvider for AzureCliCredential {
    fn name(&self) -> &str {
        "azure-cli"
    }

    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let output = tokio::process::Command::new(AZ_PROGRAM)
            .args([
                "account",
                "get-access-token",
                "--resource",
                scope_to_resource(scope),
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| {
                AgentLabError::Authentication(format!("failed to launch {AZ_PROGRAM}: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentLabError::Authentication(format!(
                "{AZ_PROGRAM} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_cli_token(&output.stdout)
    }
}

/// Tries each provider in turn and returns the first token obtained.
pub struct ChainedCredential {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredential {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment token first, then the Azure CLI.
    pub fn default_chain() -> Self {
        Self::new(vec![
            Arc::new(EnvCredential::default()),
            Arc::new(AzureCliCredential::new()),
        ])
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    fn name(&self) -> &str {
        "chained"
    }

    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.token(scope).await {
                Ok(token) => {
                    debug!(provider = provider.name(), scope, "credential resolved");
                    return Ok(token);
                }
                Err(err) => failures.push(format!("{}: {err}", provider.name())),
            }
        }
        Err(AgentLabError::Configuration(format!(
            "no credential available for {scope} ({})",
            failures.join("; ")
        )))
    }
}

/// Reuses tokens per scope until they come within the refresh margin of expiry.
pub struct CachedCredential {
    inner: Arc<dyn CredentialProvider>,
    margin: Duration,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl CachedCredential {
    pub fn new(inner: Arc<dyn CredentialProvider>) -> Self {
        Self {
            inner,
            margin: Duration::minutes(5),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CredentialProvider for CachedCredential {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope) {
            if !token.expires_within(self.margin) {
                return Ok(token.clone());
            }
        }
        let token = self.inner.token(scope).await?;
        cache.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}
