//! Threads and the messages they hold.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A remote-held conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Author of a thread message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(alias = "agent")]
    Assistant,
}

/// Request body for posting a message to a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A message stored on a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default, alias = "agent_id")]
    pub assistant_id: Option<String>,
}

impl ThreadMessage {
    /// Concatenated text of every text part, separated by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// File-path annotations attached to any text part.
    pub fn file_path_annotations(&self) -> Vec<FilePathAnnotation> {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(&text.annotations),
                _ => None,
            })
            .flatten()
            .filter_map(|annotation| match annotation {
                Annotation::FilePath { text, file_path } => Some(FilePathAnnotation {
                    text: text.clone(),
                    file_id: file_path.file_id.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Pick the most recent assistant-authored message.
///
/// Ordering is by `created_at`; messages sharing a timestamp are ordered by
/// their position in the slice.
pub fn latest_assistant_message(messages: &[ThreadMessage]) -> Option<&ThreadMessage> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == MessageRole::Assistant)
        .max_by_key(|(index, m)| (m.created_at, *index))
        .map(|(_, m)| m)
}

/// One part of a message's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: FileReference },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Annotation attached to a span of message text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    FilePath {
        text: String,
        file_path: FileReference,
    },
    FileCitation {
        text: String,
        file_citation: FileReference,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileReference {
    pub file_id: String,
}

/// A file produced by the agent and referenced from its answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePathAnnotation {
    /// Annotated text, typically a sandbox path such as `sandbox:/mnt/data/blog.md`.
    pub text: String,
    pub file_id: String,
}
