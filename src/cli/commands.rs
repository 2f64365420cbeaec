//! Handlers for the CLI subcommands.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{AskArgs, TeamArgs};
use crate::auth::{CachedCredential, ChainedCredential};
use crate::chat::{ChatAgent, ChatClient};
use crate::config::{ProjectConfig, ProjectContext};
use crate::error::AgentLabError;
use crate::session::{AgentSession, SessionSpec};
use crate::team::{
    Participant, PhraseMatch, RoundRobinTeam, SessionParticipant, StopReason, TerminationPolicy,
};
use crate::tools::{SessionTool, ToolCapability};

type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

const SEARCH_NAME: &str = "search";
const WRITER_NAME: &str = "writer";
const SAVER_NAME: &str = "saver";

const SEARCH_INSTRUCTIONS: &str = "You are a search expert. Use your web_search tool to \
find knowledge relevant to the task and report what you found.";

const WRITER_INSTRUCTIONS: &str = "You are a blog writer. Write the blog the user asks for, \
based on the search results in the conversation.";

const SAVER_INSTRUCTIONS: &str = "You save blogs. Take the most recent blog in the \
conversation, save it as a markdown file with the code interpreter, and reply with \
'Saved' followed by the file name.";

fn context(config: ProjectConfig) -> Result<ProjectContext, AgentLabError> {
    let credential = Arc::new(CachedCredential::new(Arc::new(ChainedCredential::default_chain())));
    ProjectContext::connect(config, credential)
}

pub async fn handle_ask(args: AskArgs) -> CliResult {
    let mut config = ProjectConfig::from_env();
    if let Some(secs) = args.timeout_secs {
        config = config.with_run_timeout(Duration::from_secs(secs));
    }
    let context = context(config)?;

    let mut spec = SessionSpec::new(args.task);
    if let Some(instructions) = args.instructions {
        spec = spec.with_instructions(instructions);
    }
    if args.code_interpreter {
        spec = spec.with_capability(ToolCapability::code_interpreter());
    }
    if !args.files.is_empty() {
        spec = spec.with_capability(ToolCapability::file_search(args.files));
    }
    if args.web_search {
        spec = spec.with_capability(ToolCapability::web_search());
    }
    if let Some(dir) = args.save_dir {
        spec = spec.with_artifact_dir(dir);
    }

    let session = AgentSession::start(&context, spec).await?;
    let answer = session.run().await?;

    println!("{}", answer.text);
    for path in &answer.saved_files {
        eprintln!("saved {}", path.display());
    }
    Ok(())
}

pub async fn handle_team(args: TeamArgs) -> CliResult {
    let context = context(ProjectConfig::from_env())?;

    let model = Arc::new(ChatClient::from_context(&context)?);

    let search = Arc::new(
        ChatAgent::new(SEARCH_NAME, SEARCH_INSTRUCTIONS, model.clone())
            .with_tool(Arc::new(SessionTool::web_search(context.clone()))),
    );
    let writer = Arc::new(ChatAgent::new(WRITER_NAME, WRITER_INSTRUCTIONS, model));

    let saver = SessionParticipant::new(
        SAVER_NAME,
        context.clone(),
        SessionSpec::new(String::new())
            .with_instructions(SAVER_INSTRUCTIONS)
            .with_capability(ToolCapability::code_interpreter())
            .with_artifact_dir(args.save_dir),
    );

    let mut phrase = PhraseMatch::new(args.stop_phrase).from_source(SAVER_NAME);
    if !args.case_sensitive {
        phrase = phrase.ignore_case();
    }
    let policy = TerminationPolicy::PhraseMatch(phrase) | TerminationPolicy::count_limit(args.max_turns);

    let participants: Vec<Arc<dyn Participant>> = vec![
        search.clone() as Arc<dyn Participant>,
        writer.clone() as Arc<dyn Participant>,
        Arc::new(saver),
    ];
    let team = RoundRobinTeam::new(participants, policy)?;

    let cancel = tokio_util::sync::CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let result = team.run_until_cancelled(args.task, cancel).await?;
    for message in result.messages.iter().skip(1) {
        println!("---------- {} ----------\n{}\n", message.source, message.content);
    }
    match &result.stop_reason {
        StopReason::Terminated(state) => info!(turns = result.turns, ?state, "team stopped"),
        StopReason::Cancelled => eprintln!("cancelled after {} turns", result.turns),
    }
    let mut usage = search.usage();
    usage.merge(&writer.usage());
    info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        total_tokens = usage.total_tokens,
        "chat usage"
    );
    Ok(())
}
