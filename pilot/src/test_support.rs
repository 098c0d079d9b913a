//! Test doubles for the invoker, the execution log, and the notifier.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use anyhow::{Result, anyhow};
use chrono::Utc;

use crate::core::error::AgentError;
use crate::core::types::ToolExecutionRecord;
use crate::io::execution_log::ExecutionLogSink;
use crate::io::invoker::{InvocationOutput, Invoker};
use crate::io::notifier::{NotificationOutcome, Notifier};

/// Invoker that replays canned outcomes in order and remembers every argument vector.
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    outcomes: Mutex<VecDeque<Result<InvocationOutput, AgentError>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedInvoker {
    pub fn new(outcomes: Vec<Result<InvocationOutput, AgentError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// One successful run per entry, each printing the given stdout.
    pub fn with_stdout(stdouts: &[&str]) -> Self {
        Self::new(
            stdouts
                .iter()
                .map(|stdout| {
                    Ok(InvocationOutput {
                        stdout: stdout.as_bytes().to_vec(),
                        stderr: String::new(),
                    })
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(&self, args: &[String]) -> Result<InvocationOutput, AgentError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.to_vec());
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Io(anyhow!("no scripted outcome left"))))
    }
}

/// Agent stdout for a successful result message.
pub fn result_json(text: &str, session_id: Option<&str>) -> String {
    let mut message = serde_json::json!({
        "type": "result",
        "subtype": "success",
        "result": text,
    });
    if let Some(id) = session_id {
        message["session_id"] = serde_json::Value::from(id);
    }
    message.to_string()
}

/// Execution log held in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<ToolExecutionRecord>>,
}

impl MemoryLog {
    pub fn records(&self) -> Vec<ToolExecutionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ExecutionLogSink for MemoryLog {
    fn record(&self, record: &ToolExecutionRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// A plausible record for `tool_name`.
pub fn record(tool_name: &str, result_content: &str) -> ToolExecutionRecord {
    ToolExecutionRecord {
        tool_name: tool_name.to_string(),
        arguments_json: "{}".to_string(),
        result_content: result_content.to_string(),
        is_error: false,
        executed_at: Utc::now(),
        duration_ms: 1,
    }
}

#[derive(Debug, Clone)]
enum FakeOutcome {
    Deliver,
    Deny,
    Fail(String),
}

/// Notifier with a fixed outcome that remembers what it was asked to send.
#[derive(Debug)]
pub struct FakeNotifier {
    outcome: FakeOutcome,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeNotifier {
    fn with_outcome(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn delivering() -> Self {
        Self::with_outcome(FakeOutcome::Deliver)
    }

    pub fn denying() -> Self {
        Self::with_outcome(FakeOutcome::Deny)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(FakeOutcome::Fail(message.to_string()))
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for FakeNotifier {
    fn send(&self, title: &str, body: &str) -> Result<NotificationOutcome> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_string(), body.to_string()));
        match &self.outcome {
            FakeOutcome::Deliver => Ok(NotificationOutcome::Delivered),
            FakeOutcome::Deny => Ok(NotificationOutcome::Denied),
            FakeOutcome::Fail(message) => Err(anyhow!("{message}")),
        }
    }
}
