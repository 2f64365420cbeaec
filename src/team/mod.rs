//! Round-robin teams of cooperating participants.

pub mod termination;

pub use termination::{PhraseMatch, TerminationPolicy, TerminationState, TerminationTracker};

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ProjectContext;
use crate::error::{AgentLabError, Result, RunError};
use crate::session::{AgentSession, SessionSpec};

/// Source name used for the task message.
pub const USER_SOURCE: &str = "user";

/// One message in a team transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMessage {
    pub source: String,
    pub content: String,
}

impl TeamMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Render a transcript as plain text, one `source: content` block per message.
pub fn render_transcript(transcript: &[TeamMessage]) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", m.source, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A member of a team.
#[async_trait]
pub trait Participant: Send + Sync {
    fn name(&self) -> &str;

    /// Produce this participant's next message given everything said so far.
    async fn respond(&self, transcript: &[TeamMessage]) -> Result<String>;
}

/// Why a rotation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Terminated(TerminationState),
    Cancelled,
}

/// Transcript and stop reason of a finished rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamResult {
    /// Task message followed by every participant message.
    pub messages: Vec<TeamMessage>,
    pub turns: usize,
    pub stop_reason: StopReason,
}

impl TeamResult {
    /// Last participant message, if any turn was taken.
    pub fn last_reply(&self) -> Option<&TeamMessage> {
        self.messages.iter().skip(1).last()
    }
}

/// Asks participants in fixed order until the termination policy fires.
pub struct RoundRobinTeam {
    participants: Vec<Arc<dyn Participant>>,
    policy: TerminationPolicy,
}

impl RoundRobinTeam {
    pub fn new(participants: Vec<Arc<dyn Participant>>, policy: TerminationPolicy) -> Result<Self> {
        if participants.is_empty() {
            return Err(AgentLabError::InvalidArgument(
                "a team needs at least one participant".to_string(),
            ));
        }
        policy.validate()?;
        Ok(Self {
            participants,
            policy,
        })
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.name())
    }

    pub async fn run(&self, task: impl Into<String>) -> Result<TeamResult> {
        self.run_until_cancelled(task, CancellationToken::new()).await
    }

    /// Rotate until the policy fires, a participant fails, or `cancel` fires.
    ///
    /// A cancelled rotation returns the transcript so far.
    pub async fn run_until_cancelled(
        &self,
        task: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<TeamResult> {
        let mut messages = vec![TeamMessage::new(USER_SOURCE, task)];
        let mut tracker = TerminationTracker::new(self.policy.clone());

        let mut next = 0;
        loop {
            let participant = &self.participants[next % self.participants.len()];
            next += 1;
            debug!(participant = participant.name(), turn = tracker.turns() + 1, "team turn");
            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                reply = participant.respond(&messages) => Some(reply?),
            };
            let Some(reply) = reply else {
                info!(turns = tracker.turns(), "team cancelled");
                return Ok(TeamResult {
                    messages,
                    turns: tracker.turns(),
                    stop_reason: StopReason::Cancelled,
                });
            };

            let message = TeamMessage::new(participant.name(), reply);
            let state = tracker.observe(&message).clone();
            messages.push(message);

            if state.is_terminated() {
                info!(turns = tracker.turns(), state = ?state, "team finished");
                return Ok(TeamResult {
                    messages,
                    turns: tracker.turns(),
                    stop_reason: StopReason::Terminated(state),
                });
            }
        }
    }
}

/// A participant whose every turn is a fresh [`AgentSession`].
///
/// The rendered transcript becomes the session's task.
pub struct SessionParticipant {
    name: String,
    context: ProjectContext,
    template: SessionSpec,
}

impl SessionParticipant {
    pub fn new(name: impl Into<String>, context: ProjectContext, template: SessionSpec) -> Self {
        Self {
            name: name.into(),
            context,
            template,
        }
    }
}

#[async_trait]
impl Participant for SessionParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, transcript: &[TeamMessage]) -> Result<String> {
        let mut spec = self.template.clone();
        spec.task = render_transcript(transcript);
        if spec.agent_name.is_none() {
            spec.agent_name = Some(self.name.clone());
        }

        let session = AgentSession::start(&self.context, spec).await?;
        match session.run().await {
            Ok(answer) => Ok(answer.text),
            Err(RunError::Service(err)) => Err(err),
            Err(err) => Err(AgentLabError::InvalidState(format!(
                "participant {} produced no answer: {err}",
                self.name
            ))),
        }
    }
}
