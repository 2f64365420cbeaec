//! Chat-completion participants: a hosted chat deployment plus local tools.

pub mod agent;
pub mod client;
pub mod message;

pub use agent::ChatAgent;
pub use client::{ChatClient, ChatCompletion, ChatModel, FinishReason};
pub use message::{ChatMessage, ChatRole, ChatToolCall, FunctionCall};
