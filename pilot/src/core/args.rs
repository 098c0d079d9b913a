//! Argument vectors for agent CLI invocations.
//!
//! Everything here is pure: the same inputs always produce the same vector.

use std::path::Path;

/// Suffix appended to the agent's system prompt on every invocation.
pub const SYSTEM_PROMPT: &str = "You are Pilot, a personal AI assistant running on the user's desktop. \
Keep responses concise and actionable. Do not use markdown formatting unless \
explicitly requested. Respond in plain text.";

/// Name the companion server is registered under in the tool-config file.
pub const TOOL_SERVER_NAME: &str = "pilot";

/// Tool identifiers the agent may call when tools are enabled.
pub const ALLOWED_TOOLS: [&str; 4] = [
    "mcp__pilot__clipboard",
    "mcp__pilot__notification",
    "mcp__pilot__shell",
    "mcp__pilot__web",
];

pub const DEFAULT_SINGLE_TURN_MAX_TURNS: u32 = 1;
pub const DEFAULT_TOOL_MAX_TURNS: u32 = 5;
pub const DEFAULT_SESSION_MAX_TURNS: u32 = 3;

/// How the agent should treat conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationMode {
    /// One-shot; the agent persists nothing.
    SingleTurn,
    /// Persist the conversation and return its session id.
    StartSession,
    /// Continue an existing conversation.
    ResumeSession(String),
}

impl InvocationMode {
    fn default_max_turns(&self, tools_enabled: bool) -> u32 {
        match self {
            InvocationMode::SingleTurn if tools_enabled => DEFAULT_TOOL_MAX_TURNS,
            InvocationMode::SingleTurn => DEFAULT_SINGLE_TURN_MAX_TURNS,
            InvocationMode::StartSession | InvocationMode::ResumeSession(_) => {
                DEFAULT_SESSION_MAX_TURNS
            }
        }
    }
}

/// Inputs for one invocation.
#[derive(Debug, Clone)]
pub struct InvocationRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub mode: InvocationMode,
    /// Overrides the mode's default turn budget.
    pub max_turns: Option<u32>,
    /// Tool-config file; when set, tool access is limited to [`ALLOWED_TOOLS`].
    pub tool_config: Option<&'a Path>,
}

impl<'a> InvocationRequest<'a> {
    pub fn new(prompt: &'a str, model: &'a str, mode: InvocationMode) -> Self {
        Self {
            prompt,
            model,
            mode,
            max_turns: None,
            tool_config: None,
        }
    }

    pub fn with_tool_config(mut self, path: &'a Path) -> Self {
        self.tool_config = Some(path);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Build the argument vector for `request`.
pub fn build_args(request: &InvocationRequest<'_>) -> Vec<String> {
    let max_turns = request
        .max_turns
        .unwrap_or_else(|| request.mode.default_max_turns(request.tool_config.is_some()));

    let mut args = vec![
        "-p".to_string(),
        request.prompt.to_string(),
        "--output-format".to_string(),
        "json".to_string(),
        "--model".to_string(),
        request.model.to_string(),
        "--max-turns".to_string(),
        max_turns.to_string(),
    ];

    if request.mode == InvocationMode::SingleTurn {
        args.push("--no-session-persistence".to_string());
    }

    args.push("--append-system-prompt".to_string());
    args.push(SYSTEM_PROMPT.to_string());

    if let InvocationMode::ResumeSession(session_id) = &request.mode {
        args.push("--resume".to_string());
        args.push(session_id.clone());
    }

    match request.tool_config {
        Some(path) => {
            args.push("--mcp-config".to_string());
            args.push(path.display().to_string());
            args.push("--allowedTools".to_string());
            args.push(ALLOWED_TOOLS.join(" "));
        }
        None => {
            args.push("--tools".to_string());
            args.push(String::new());
        }
    }

    args
}
