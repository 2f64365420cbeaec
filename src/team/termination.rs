//! Termination policies for round-robin rotations.

use std::ops::BitOr;

use crate::error::{AgentLabError, Result};

use super::TeamMessage;

/// Substring condition on participant messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    pub phrase: String,
    pub ignore_case: bool,
    /// Participants whose messages may trigger the match; empty means anyone.
    pub sources: Vec<String>,
}

impl PhraseMatch {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            ignore_case: false,
            sources: Vec::new(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Only messages from `source` can trigger the match. May be repeated.
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    fn matches(&self, message: &TeamMessage) -> bool {
        if !self.sources.is_empty() && !self.sources.iter().any(|s| *s == message.source) {
            return false;
        }
        if self.ignore_case {
            message
                .content
                .to_lowercase()
                .contains(&self.phrase.to_lowercase())
        } else {
            message.content.contains(&self.phrase)
        }
    }
}

/// When a rotation stops.
///
/// Combine with `|`: the rotation stops at the first turn on which any
/// component is satisfied. When several are satisfied on the same turn the
/// leftmost one is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Stop after this many participant turns.
    CountLimit(usize),
    /// Stop at the first participant message containing the phrase.
    PhraseMatch(PhraseMatch),
    Any(Vec<TerminationPolicy>),
}

impl TerminationPolicy {
    pub fn count_limit(turns: usize) -> Self {
        Self::CountLimit(turns)
    }

    pub fn phrase(phrase: impl Into<String>) -> Self {
        Self::PhraseMatch(PhraseMatch::new(phrase))
    }

    /// Reject policies that can never be meaningfully evaluated.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::CountLimit(0) => Err(AgentLabError::InvalidArgument(
                "count limit must be at least 1".to_string(),
            )),
            Self::PhraseMatch(m) if m.phrase.is_empty() => Err(AgentLabError::InvalidArgument(
                "termination phrase must not be empty".to_string(),
            )),
            Self::Any(policies) if policies.is_empty() => Err(AgentLabError::InvalidArgument(
                "combined termination policy has no conditions".to_string(),
            )),
            Self::Any(policies) => policies.iter().try_for_each(Self::validate),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, turns: usize, message: &TeamMessage) -> TerminationState {
        match self {
            Self::CountLimit(limit) if turns >= *limit => TerminationState::TerminatedByCount { turns },
            Self::PhraseMatch(m) if m.matches(message) => TerminationState::TerminatedByPhrase {
                phrase: m.phrase.clone(),
                source: message.source.clone(),
                turns,
            },
            Self::Any(policies) => policies
                .iter()
                .map(|p| p.evaluate(turns, message))
                .find(TerminationState::is_terminated)
                .unwrap_or(TerminationState::Running),
            _ => TerminationState::Running,
        }
    }
}

impl BitOr for TerminationPolicy {
    type Output = TerminationPolicy;

    fn bitor(self, rhs: Self) -> Self::Output {
        let mut policies = match self {
            Self::Any(policies) => policies,
            other => vec![other],
        };
        match rhs {
            Self::Any(more) => policies.extend(more),
            other => policies.push(other),
        }
        Self::Any(policies)
    }
}

/// State of a rotation under a [`TerminationPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    TerminatedByCount {
        turns: usize,
    },
    TerminatedByPhrase {
        phrase: String,
        source: String,
        turns: usize,
    },
}

impl TerminationState {
    pub fn is_terminated(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Applies a policy turn by turn. Terminal states are sticky.
#[derive(Debug, Clone)]
pub struct TerminationTracker {
    policy: TerminationPolicy,
    turns: usize,
    state: TerminationState,
}

impl TerminationTracker {
    pub fn new(policy: TerminationPolicy) -> Self {
        Self {
            policy,
            turns: 0,
            state: TerminationState::Running,
        }
    }

    /// Record one participant turn.
    pub fn observe(&mut self, message: &TeamMessage) -> &TerminationState {
        if !self.state.is_terminated() {
            self.turns += 1;
            self.state = self.policy.evaluate(self.turns, message);
        }
        &self.state
    }

    pub fn state(&self) -> &TerminationState {
        &self.state
    }

    pub fn turns(&self) -> usize {
        self.turns
    }
}
