//! High-level agent calls: one-shot questions, tool-enabled runs, and sessions.
//!
//! Each call resolves to exactly one agent subprocess through the [`Invoker`].
//! Tool-enabled runs additionally write a tool-config file naming the
//! companion server and collect the execution records it logged.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::core::args::{InvocationMode, InvocationRequest, build_args};
use crate::core::error::AgentError;
use crate::core::output::{parse_result, parse_session_result};
use crate::core::types::{InvocationResult, ToolExecutionRecord};
use crate::io::execution_log::import_log;
use crate::io::invoker::Invoker;
use crate::io::mcp_config::ToolConfigFile;

/// Outcome of a tool-enabled run plus every tool call the agent made during it.
///
/// Records are kept even when the run itself failed, since the tools may
/// already have had side effects.
#[derive(Debug)]
pub struct ToolRun {
    pub outcome: Result<String, AgentError>,
    pub records: Vec<ToolExecutionRecord>,
}

pub struct Assistant<I: Invoker> {
    invoker: I,
    model: String,
    tool_server_path: PathBuf,
}

impl<I: Invoker> Assistant<I> {
    pub fn new(invoker: I, model: impl Into<String>, tool_server_path: impl Into<PathBuf>) -> Self {
        Self {
            invoker,
            model: model.into(),
            tool_server_path: tool_server_path.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Single-turn question without tool access.
    #[instrument(skip_all)]
    pub fn ask(&self, prompt: &str) -> Result<String, AgentError> {
        let request = InvocationRequest::new(prompt, &self.model, InvocationMode::SingleTurn);
        let stdout = self.run(&request)?;
        parse_result(&stdout)
    }

    /// Single-turn question with the companion tools enabled.
    ///
    /// Only a failure to write the tool config is returned as `Err`; agent
    /// failures land in [`ToolRun::outcome`] next to the imported records.
    #[instrument(skip_all, fields(server = %self.tool_server_path.display()))]
    pub fn ask_with_tools(&self, prompt: &str) -> Result<ToolRun, AgentError> {
        let config = ToolConfigFile::write(&self.tool_server_path)?;
        let request = InvocationRequest::new(prompt, &self.model, InvocationMode::SingleTurn)
            .with_tool_config(config.config_path());
        let outcome = self.run(&request).and_then(|stdout| parse_result(&stdout));

        let records = match import_log(config.log_path()) {
            Ok(records) => records,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "failed to import tool execution log");
                Vec::new()
            }
        };
        info!(
            tool_calls = records.len(),
            ok = outcome.is_ok(),
            "tool-enabled run finished"
        );
        Ok(ToolRun { outcome, records })
    }

    /// Start a persisted conversation; the result always carries the agent's session id.
    #[instrument(skip_all)]
    pub fn start_session(&self, prompt: &str) -> Result<InvocationResult, AgentError> {
        let request = InvocationRequest::new(prompt, &self.model, InvocationMode::StartSession);
        let stdout = self.run(&request)?;
        let (result_text, session_id) = parse_session_result(&stdout)?;
        debug!(session_id = %session_id, "session started");
        Ok(InvocationResult {
            result_text,
            session_id: Some(session_id),
        })
    }

    /// Continue the conversation identified by the agent's `external_session_id`.
    #[instrument(skip_all, fields(session_id = %external_session_id))]
    pub fn continue_session(
        &self,
        prompt: &str,
        external_session_id: &str,
    ) -> Result<String, AgentError> {
        let request = InvocationRequest::new(
            prompt,
            &self.model,
            InvocationMode::ResumeSession(external_session_id.to_string()),
        );
        let stdout = self.run(&request)?;
        parse_result(&stdout)
    }

    fn run(&self, request: &InvocationRequest<'_>) -> Result<Vec<u8>, AgentError> {
        let args = build_args(request);
        let output = self.invoker.invoke(&args)?;
        if !output.stderr.trim().is_empty() {
            debug!(stderr = %output.stderr.trim(), "agent stderr");
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(AgentError::NoOutputData);
        }
        Ok(output.stdout)
    }
}
