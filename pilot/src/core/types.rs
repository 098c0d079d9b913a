//! Shared types for agent invocations, sessions, and tool executions.
//!
//! These types carry no I/O. Wire names follow the formats consumed by the
//! agent CLI and by the execution log importer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed outcome of one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub result_text: String,
    /// Set only for session-creating invocations.
    pub session_id: Option<String>,
}

/// Local metadata for a resumable agent conversation.
///
/// The agent owns the conversation itself; this record only maps a local id
/// and display name onto the agent's session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    external_session_id: String,
    pub display_name: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        external_session_id: impl Into<String>,
        display_name: impl Into<String>,
        model: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            external_session_id: external_session_id.into(),
            display_name: display_name.into(),
            model: model.into(),
            created_at: now,
            last_used_at: now,
        }
    }

    pub fn external_session_id(&self) -> &str {
        &self.external_session_id
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    /// Record a use. Timestamps older than the current value are ignored.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_used_at {
            self.last_used_at = now;
        }
    }
}

/// One tool invocation as reported by the protocol server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionRecord {
    pub tool_name: String,
    /// Arguments as compact JSON text.
    #[serde(rename = "arguments")]
    pub arguments_json: String,
    pub result_content: String,
    pub is_error: bool,
    pub executed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn touch_only_moves_forward() {
        let start = Utc::now();
        let mut session = Session::new("ext-1", "name", "sonnet", start);

        session.touch(start - Duration::seconds(30));
        assert_eq!(session.last_used_at(), start);

        let later = start + Duration::seconds(30);
        session.touch(later);
        assert_eq!(session.last_used_at(), later);
        assert_eq!(session.created_at, start);
        assert_eq!(session.external_session_id(), "ext-1");
    }

    #[test]
    fn execution_record_uses_camel_case_wire_names() {
        let record = ToolExecutionRecord {
            tool_name: "shell".to_string(),
            arguments_json: r#"{"command":"ls"}"#.to_string(),
            result_content: "ok".to_string(),
            is_error: false,
            executed_at: Utc::now(),
            duration_ms: 12,
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["toolName"], "shell");
        assert_eq!(value["arguments"], r#"{"command":"ls"}"#);
        assert_eq!(value["resultContent"], "ok");
        assert_eq!(value["isError"], false);
        assert_eq!(value["durationMs"], 12);
        assert!(value["executedAt"].is_string());
    }
}
