//! Round-robin rotation and termination.

mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use agentlab::error::{AgentLabError, Result};
use agentlab::session::SessionSpec;
use agentlab::team::{
    Participant, PhraseMatch, RoundRobinTeam, SessionParticipant, StopReason, TeamMessage,
    TerminationPolicy, TerminationState,
};
use agentlab::types::{MessageRole, RunStatus};

use common::{context_with, test_config, text_message, MockAgentService};

/// Replies from a script, then repeats its fallback.
struct Scripted {
    name: String,
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    seen: Mutex<Vec<usize>>,
}

impl Scripted {
    fn new(name: &str, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fallback: format!("{name} has nothing to add"),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Participant for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, transcript: &[TeamMessage]) -> Result<String> {
        self.seen.lock().unwrap().push(transcript.len());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

struct Stalled;

#[async_trait]
impl Participant for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn respond(&self, _transcript: &[TeamMessage]) -> Result<String> {
        std::future::pending().await
    }
}

struct Broken;

#[async_trait]
impl Participant for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn respond(&self, _transcript: &[TeamMessage]) -> Result<String> {
        Err(AgentLabError::api(500, "model unavailable"))
    }
}

fn sources(messages: &[TeamMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.source.as_str()).collect()
}

#[tokio::test]
async fn count_limit_stops_at_exact_turn() {
    let team = RoundRobinTeam::new(
        vec![Scripted::new("writer", &[]), Scripted::new("saver", &[])],
        TerminationPolicy::count_limit(3),
    )
    .unwrap();

    let result = team.run("Write a blog").await.unwrap();

    assert_eq!(result.turns, 3);
    assert_eq!(sources(&result.messages), vec!["user", "writer", "saver", "writer"]);
    assert_eq!(
        result.stop_reason,
        StopReason::Terminated(TerminationState::TerminatedByCount { turns: 3 })
    );
}

#[tokio::test]
async fn phrase_before_count_limit_wins() {
    let policy = TerminationPolicy::phrase("Saved") | TerminationPolicy::count_limit(10);
    let team = RoundRobinTeam::new(
        vec![
            Scripted::new("writer", &["Here is the blog"]),
            Scripted::new("saver", &["Saved blog.md"]),
        ],
        policy,
    )
    .unwrap();

    let result = team.run("Write a blog").await.unwrap();

    assert_eq!(result.turns, 2);
    assert_eq!(result.last_reply().unwrap().content, "Saved blog.md");
    assert_eq!(
        result.stop_reason,
        StopReason::Terminated(TerminationState::TerminatedByPhrase {
            phrase: "Saved".to_string(),
            source: "saver".to_string(),
            turns: 2,
        })
    );
}

#[tokio::test]
async fn three_participants_never_exceed_count_limit() {
    let team = RoundRobinTeam::new(
        vec![
            Scripted::new("a", &[]),
            Scripted::new("b", &[]),
            Scripted::new("c", &[]),
        ],
        TerminationPolicy::count_limit(10),
    )
    .unwrap();

    let result = team.run("task").await.unwrap();

    assert_eq!(result.turns, 10);
    assert_eq!(result.messages.len(), 11);
    assert_eq!(
        sources(&result.messages[1..]),
        vec!["a", "b", "c", "a", "b", "c", "a", "b", "c", "a"]
    );
}

#[tokio::test]
async fn participants_see_the_whole_transcript() {
    let writer = Scripted::new("writer", &[]);
    let saver = Scripted::new("saver", &[]);
    let team = RoundRobinTeam::new(
        vec![writer.clone(), saver.clone()],
        TerminationPolicy::count_limit(4),
    )
    .unwrap();

    team.run("task").await.unwrap();

    assert_eq!(*writer.seen.lock().unwrap(), vec![1, 3]);
    assert_eq!(*saver.seen.lock().unwrap(), vec![2, 4]);
}

#[tokio::test]
async fn phrase_from_other_sources_is_ignored() {
    let policy = TerminationPolicy::PhraseMatch(PhraseMatch::new("saved").ignore_case().from_source("saver"))
        | TerminationPolicy::count_limit(10);
    let team = RoundRobinTeam::new(
        vec![
            Scripted::new("writer", &["I have SAVED nothing yet"]),
            Scripted::new("saver", &["working", "SAVED blog.md"]),
        ],
        policy,
    )
    .unwrap();

    let result = team.run("Write a blog").await.unwrap();

    assert_eq!(result.turns, 4);
    assert!(matches!(
        result.stop_reason,
        StopReason::Terminated(TerminationState::TerminatedByPhrase { ref source, .. }) if source == "saver"
    ));
}

#[tokio::test]
async fn phrase_matching_is_case_sensitive_by_default() {
    let policy = TerminationPolicy::phrase("Saved") | TerminationPolicy::count_limit(2);
    let team = RoundRobinTeam::new(vec![Scripted::new("saver", &["saved it"])], policy).unwrap();

    let result = team.run("task").await.unwrap();

    assert_eq!(
        result.stop_reason,
        StopReason::Terminated(TerminationState::TerminatedByCount { turns: 2 })
    );
}

#[tokio::test]
async fn cancellation_returns_transcript_so_far() {
    let team = RoundRobinTeam::new(
        vec![Scripted::new("writer", &["draft"]), Arc::new(Stalled)],
        TerminationPolicy::count_limit(10),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = team.run_until_cancelled("task", cancel).await.unwrap();

    assert_eq!(result.stop_reason, StopReason::Cancelled);
    assert_eq!(result.turns, 1);
    assert_eq!(sources(&result.messages), vec!["user", "writer"]);
}

#[tokio::test]
async fn participant_errors_stop_the_rotation() {
    let team = RoundRobinTeam::new(
        vec![Scripted::new("writer", &[]), Arc::new(Broken)],
        TerminationPolicy::count_limit(10),
    )
    .unwrap();

    let err = team.run("task").await.unwrap_err();
    assert!(matches!(err, AgentLabError::Api { status: 500, .. }));
}

#[test]
fn invalid_policies_are_rejected() {
    let participants: Vec<Arc<dyn Participant>> = vec![Scripted::new("a", &[])];
    assert!(RoundRobinTeam::new(participants.clone(), TerminationPolicy::count_limit(0)).is_err());
    assert!(RoundRobinTeam::new(participants.clone(), TerminationPolicy::phrase("")).is_err());
    assert!(RoundRobinTeam::new(participants, TerminationPolicy::Any(vec![])).is_err());
}

#[tokio::test]
async fn session_participants_run_a_fresh_session_per_turn() {
    let service = Arc::new(
        MockAgentService::new()
            .with_run_statuses([RunStatus::Completed])
            .with_message(text_message("msg_1", MessageRole::Assistant, "Saved blog.md", 1)),
    );
    let context = context_with(test_config(), service.clone());
    let saver = SessionParticipant::new("saver", context, SessionSpec::new(String::new()));
    let team = RoundRobinTeam::new(
        vec![Scripted::new("writer", &["# My blog"]), Arc::new(saver)],
        TerminationPolicy::phrase("Saved") | TerminationPolicy::count_limit(6),
    )
    .unwrap();

    let result = team.run("Write a blog").await.unwrap();

    assert_eq!(result.turns, 2);
    assert_eq!(
        service.posted(),
        vec!["user: Write a blog\n\nwriter: # My blog".to_string()]
    );
    assert_eq!(service.count("create_agent"), 1);
    assert_eq!(service.count("delete_agent"), 1);
    assert_eq!(service.definitions()[0].name.as_deref(), Some("saver"));
}
