//! Desktop assistant CLI.
//!
//! Sends prompts to the locally installed `claude` CLI, optionally with the
//! `pilot-tools` companion server attached so the agent can use the
//! clipboard, notifications, a shell, and the web. Conversation sessions and
//! tool history are kept under the configured data directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pilot::assistant::Assistant;
use pilot::core::error::AgentError;
use pilot::core::types::ToolExecutionRecord;
use pilot::exit_codes;
use pilot::io::clipboard::{Clipboard, SystemClipboard};
use pilot::io::config::{PilotConfig, default_config_path, load_config};
use pilot::io::execution_log::{JsonlLog, read_log};
use pilot::io::invoker::CliInvoker;
use pilot::io::notifier::{NotificationOutcome, Notifier, SystemNotifier};
use pilot::io::prompt::{PromptEngine, prepare_file_content, session_display_name};
use pilot::io::resolver::ExecutableResolver;
use pilot::io::session_store::SessionStore;
use pilot::logging::{self, LogTarget};
use pilot::tools::notification::DENIED_GUIDANCE;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "pilot",
    version,
    about = "Desktop assistant bridge to the local claude CLI"
)]
struct Cli {
    /// Config file. Defaults to `<config dir>/pilot/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a one-shot question.
    Ask {
        /// Let the agent use the clipboard, notification, shell, and web tools.
        #[arg(long)]
        tools: bool,
        prompt: String,
    },
    /// Summarize a file, or the clipboard text when no file is given.
    Summarize {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Rewrite text according to an instruction. Uses the clipboard when no text is given.
    Transform {
        #[arg(short, long)]
        instruction: String,
        text: Option<String>,
    },
    /// Multi-turn conversations.
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Post a desktop notification.
    Notify { title: String, body: String },
    /// Show recent tool calls made by the agent.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Start a new session with a first prompt.
    Start { prompt: String },
    /// Continue a session; defaults to the most recently used one.
    Continue {
        /// Local session id (see `pilot session list`).
        #[arg(long)]
        id: Option<String>,
        message: String,
    },
    /// List sessions, most recently used first.
    List,
    /// Forget a session.
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
}

fn main() {
    logging::init(LogTarget::Terminal);
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_effective_config(cli.config.as_deref())?;
    match cli.command {
        Command::Ask { tools, prompt } => cmd_ask(&config, &prompt, tools),
        Command::Summarize { file } => cmd_summarize(&config, file.as_deref()),
        Command::Transform { instruction, text } => cmd_transform(&config, &instruction, text),
        Command::Session { command } => match command {
            SessionCommand::Start { prompt } => cmd_session_start(&config, &prompt),
            SessionCommand::Continue { id, message } => {
                cmd_session_continue(&config, id.as_deref(), &message)
            }
            SessionCommand::List => cmd_session_list(&config),
            SessionCommand::Delete { id } => cmd_session_delete(&config, &id),
        },
        Command::Notify { title, body } => cmd_notify(&config, &title, &body),
        Command::History { limit } => cmd_history(&config, limit),
        Command::Config {
            command: ConfigCommand::Show,
        } => cmd_config_show(&config),
    }
}

fn load_effective_config(explicit: Option<&Path>) -> Result<PilotConfig> {
    match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_config(&path),
        None => Ok(PilotConfig::default()),
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AgentError>() {
        Some(AgentError::ExecutableNotFound) => exit_codes::AGENT_NOT_FOUND,
        Some(AgentError::Io(_)) | None => exit_codes::INVALID,
        Some(_) => exit_codes::AGENT_FAILED,
    }
}

fn build_assistant(config: &PilotConfig) -> Result<Assistant<CliInvoker>> {
    let resolver = match &config.agent.executable {
        Some(path) => ExecutableResolver::with_override(path.clone()),
        None => ExecutableResolver::new(),
    };
    let invoker = CliInvoker::new(
        resolver,
        config.agent.timeout(),
        config.agent.output_limit_bytes,
    );
    Ok(Assistant::new(
        invoker,
        config.agent.model.clone(),
        config.tool_server_path()?,
    ))
}

fn cmd_ask(config: &PilotConfig, prompt: &str, tools: bool) -> Result<()> {
    let assistant = build_assistant(config)?;
    if !tools {
        println!("{}", assistant.ask(prompt)?);
        return Ok(());
    }

    let run = assistant.ask_with_tools(prompt)?;
    if !run.records.is_empty() {
        match append_history(config, &run.records) {
            Ok(()) => info!(tool_calls = run.records.len(), "recorded tool history"),
            Err(err) => warn!(err = %format!("{err:#}"), "failed to append tool history"),
        }
    }
    println!("{}", run.outcome?);
    Ok(())
}

/// Tool calls are recorded whether or not the run that made them succeeded.
fn append_history(config: &PilotConfig, records: &[ToolExecutionRecord]) -> Result<()> {
    JsonlLog::new(config.history_path()?).append_all(records)
}

fn cmd_summarize(config: &PilotConfig, file: Option<&Path>) -> Result<()> {
    let prompts = PromptEngine::new();
    let prompt = match file {
        Some(path) => {
            let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
            let Some(content) = prepare_file_content(&data) else {
                bail!("{} is empty or not UTF-8 text", path.display());
            };
            let name = path.file_name().map(|name| name.to_string_lossy());
            prompts.summarize_file(name.as_deref(), &content)?
        }
        None => match clipboard_text()? {
            Some(text) => prompts.summarize_text(&text)?,
            None => {
                println!("The clipboard is empty or contains no text.");
                return Ok(());
            }
        },
    };
    println!("{}", build_assistant(config)?.ask(&prompt)?);
    Ok(())
}

fn cmd_transform(config: &PilotConfig, instruction: &str, text: Option<String>) -> Result<()> {
    if instruction.trim().is_empty() {
        bail!("instruction must be non-empty");
    }
    let text = match text {
        Some(text) => text,
        None => clipboard_text()?.context("no text given and the clipboard is empty")?,
    };
    let prompt = PromptEngine::new().transform(&text, instruction)?;
    println!("{}", build_assistant(config)?.ask(&prompt)?);
    Ok(())
}

/// Clipboard text, or `None` when it is blank.
fn clipboard_text() -> Result<Option<String>> {
    let text = SystemClipboard::new()
        .read_text()
        .context("read clipboard")?;
    Ok(text.filter(|text| !text.trim().is_empty()))
}

fn cmd_session_start(config: &PilotConfig, prompt: &str) -> Result<()> {
    let assistant = build_assistant(config)?;
    let started = assistant.start_session(prompt)?;
    let external_id = started
        .session_id
        .as_deref()
        .ok_or(AgentError::NoSessionId)?;
    let store = SessionStore::new(config.sessions_path()?);
    let session = store.create(
        external_id,
        &session_display_name(prompt),
        assistant.model(),
    )?;
    eprintln!("session: {}", session.id);
    println!("{}", started.result_text);
    Ok(())
}

fn cmd_session_continue(config: &PilotConfig, id: Option<&str>, message: &str) -> Result<()> {
    let store = SessionStore::new(config.sessions_path()?);
    let session = store.resolve(id)?;
    let reply = build_assistant(config)?.continue_session(message, session.external_session_id())?;
    store.touch(&session.id)?;
    println!("{reply}");
    Ok(())
}

fn cmd_session_list(config: &PilotConfig) -> Result<()> {
    let store = SessionStore::new(config.sessions_path()?);
    for session in store.all()? {
        println!(
            "{}\t{}\t{}\t{}",
            session.id,
            session.last_used_at().format("%Y-%m-%d %H:%M"),
            session.model,
            session.display_name
        );
    }
    Ok(())
}

fn cmd_session_delete(config: &PilotConfig, id: &str) -> Result<()> {
    let store = SessionStore::new(config.sessions_path()?);
    if !store.delete(id)? {
        bail!("session not found: {id}");
    }
    Ok(())
}

fn cmd_notify(config: &PilotConfig, title: &str, body: &str) -> Result<()> {
    let notifier = SystemNotifier::new(config.notifications.enabled);
    match notifier.send(title, body)? {
        NotificationOutcome::Delivered => println!("Notification sent."),
        NotificationOutcome::Denied => println!("{DENIED_GUIDANCE}"),
    }
    Ok(())
}

fn cmd_history(config: &PilotConfig, limit: usize) -> Result<()> {
    let records = read_log(&config.history_path()?)?;
    let skip = records.len().saturating_sub(limit);
    for record in records.iter().skip(skip) {
        println!(
            "{}\t{}\t{}\t{}ms\t{}",
            record.executed_at.format("%Y-%m-%d %H:%M:%S"),
            record.tool_name,
            if record.is_error { "error" } else { "ok" },
            record.duration_ms,
            record.arguments_json
        );
    }
    Ok(())
}

fn cmd_config_show(config: &PilotConfig) -> Result<()> {
    print!(
        "{}",
        toml::to_string_pretty(config).context("serialize config toml")?
    );
    Ok(())
}
