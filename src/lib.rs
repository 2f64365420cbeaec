//! agentlab: run tasks on hosted AI agents and coordinate teams of them.
//!
//! A [`session::AgentSession`] provisions a remote agent with tool
//! capabilities (code interpreter, file search, web search), sends it one
//! task, waits for the run and returns the latest assistant message. Every
//! remote resource it created is released before `run` returns, and a
//! dropped session releases them in the background.
//!
//! [`team::RoundRobinTeam`] asks a fixed rotation of participants for
//! messages until a [`team::TerminationPolicy`] fires.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentlab::prelude::*;
//!
//! # async fn example() -> agentlab::error::Result<()> {
//! let context = ProjectContext::connect(
//!     ProjectConfig::from_env(),
//!     Arc::new(ChainedCredential::default_chain()),
//! )?;
//! let spec = SessionSpec::new("Plot y = x^2 and save it as a PNG")
//!     .with_capability(ToolCapability::code_interpreter())
//!     .with_artifact_dir("./output");
//! match AgentSession::start(&context, spec).await?.run().await {
//!     Ok(answer) => println!("{}", answer.text),
//!     Err(err) => eprintln!("run failed: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod service;
pub mod session;
pub mod team;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "chat")]
pub mod chat;

#[cfg(feature = "cli")]
pub mod cli;
