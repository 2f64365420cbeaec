//! Credential providers for the agent service and chat deployments.

pub mod credential;
pub mod token;

pub use credential::{
    AzureCliCredential, CachedCredential, ChainedCredential, CredentialProvider, EnvCredential,
    StaticCredential,
};
pub use token::AccessToken;

/// Token scope for project-level agent operations.
pub const AGENTS_SCOPE: &str = "https://management.azure.com/.default";

/// Token scope for hosted chat-completions deployments.
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";
