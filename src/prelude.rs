//! Convenience re-exports for common use.

pub use crate::auth::{ChainedCredential, CredentialProvider, StaticCredential};
pub use crate::config::{ProjectConfig, ProjectContext};
pub use crate::error::{AgentLabError, Result, RunError};
pub use crate::service::AgentService;
pub use crate::session::{AgentSession, Answer, SessionSpec};
pub use crate::team::{
    Participant, PhraseMatch, RoundRobinTeam, SessionParticipant, StopReason, TeamResult,
    TerminationPolicy,
};
pub use crate::tools::{FnTool, SessionTool, Tool, ToolCapability, ToolParameters};

#[cfg(feature = "chat")]
pub use crate::chat::{ChatAgent, ChatClient};
