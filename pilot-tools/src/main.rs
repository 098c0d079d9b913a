//! Companion tool server for pilot.
//!
//! The agent spawns this binary as a stdio server during tool-enabled runs.
//! It answers newline-delimited JSON-RPC requests on stdin/stdout until stdin
//! closes, and appends one record per tool call to `--log-file` when given.
//! Diagnostics go to stderr only.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pilot::exit_codes;
use pilot::io::clipboard::SystemClipboard;
use pilot::io::config::{PilotConfig, default_config_path, load_config};
use pilot::io::execution_log::{DiscardLog, ExecutionLogSink, JsonlLog};
use pilot::io::notifier::SystemNotifier;
use pilot::logging::{self, LogTarget};
use pilot::protocol::{Dispatcher, serve};
use pilot::tools::ToolRegistry;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "pilot-tools",
    version,
    about = "Stdio tool server the agent spawns during tool-enabled pilot runs"
)]
struct Cli {
    /// Append one JSON line per executed tool call to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Config file. Defaults to `<config dir>/pilot/config.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    logging::init(LogTarget::Captured);
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.or_else(default_config_path) {
        Some(path) => load_config(&path)?,
        None => PilotConfig::default(),
    };

    let registry = ToolRegistry::builtin(
        Arc::new(SystemClipboard::new()),
        Arc::new(SystemNotifier::new(config.notifications.enabled)),
        config.shell(),
    );
    let sink: Box<dyn ExecutionLogSink> = match cli.log_file {
        Some(path) => Box::new(JsonlLog::new(path)),
        None => Box::new(DiscardLog),
    };
    let dispatcher = Dispatcher::new(&registry, sink.as_ref());

    info!(tools = registry.tools().count(), "serving tools on stdio");
    serve(io::stdin().lock(), io::stdout().lock(), &dispatcher)
}
