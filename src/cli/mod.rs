//! CLI entry point for agentlab.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// agentlab CLI
#[derive(Parser, Debug)]
#[command(name = "agentlab", version, about = "Run tasks on hosted AI agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Give one task to a single agent
    Ask(AskArgs),
    /// Have search, writer and saver agents take turns on a task
    Team(TeamArgs),
}

/// Arguments for `agentlab ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Task for the agent
    pub task: String,

    /// Agent instructions
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// Enable the code interpreter
    #[arg(long)]
    pub code_interpreter: bool,

    /// Upload a file for file search (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Enable web search through the configured search connection
    #[arg(long)]
    pub web_search: bool,

    /// Directory to save files the agent produces
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Give up on the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for `agentlab team`.
#[derive(Parser, Debug)]
pub struct TeamArgs {
    /// Task for the team
    pub task: String,

    /// Stop after this many participant turns
    #[arg(long, default_value_t = 10)]
    pub max_turns: usize,

    /// Stop when the saver's reply contains this phrase (any case)
    #[arg(long, default_value = "Saved")]
    pub stop_phrase: String,

    /// Only match the stop phrase with its exact case
    #[arg(long)]
    pub case_sensitive: bool,

    /// Directory the saver writes files into
    #[arg(long, default_value = "./output")]
    pub save_dir: PathBuf,
}
