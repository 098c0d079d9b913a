//! Typed failures for agent invocations.

use thiserror::Error;

/// Errors surfaced by the resolver, invoker, and output parser.
///
/// Every variant is terminal for the operation that raised it.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent executable not found; install the claude CLI or set agent.executable")]
    ExecutableNotFound,

    #[error("agent exited with code {code}: {stderr}")]
    ProcessExitedWithError { code: i32, stderr: String },

    #[error("agent timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("agent produced no output")]
    NoOutputData,

    #[error("failed to decode agent response: {0}")]
    JsonDecodingFailed(#[source] serde_json::Error),

    #[error("agent response contained no result message")]
    NoResultMessage,

    #[error("agent response contained no session id")]
    NoSessionId,

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_error_message_includes_code_and_stderr() {
        let err = AgentError::ProcessExitedWithError {
            code: 2,
            stderr: "bad flag".to_string(),
        };
        assert_eq!(err.to_string(), "agent exited with code 2: bad flag");
    }
}
