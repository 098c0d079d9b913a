use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::core::text::truncate_chars;
use crate::io::process::{CommandOutput, run_isolated_command};
use crate::tools::{ParameterType, Tool, ToolArgs, ToolParameter, ToolResult, required_str};

const PARAMETERS: &[ToolParameter] = &[
    ToolParameter {
        name: "command",
        description: "The shell command to execute. Supports pipes, redirects, and shell features.",
        kind: ParameterType::String,
        required: true,
        enum_values: None,
    },
    ToolParameter {
        name: "timeout",
        description: "Maximum execution time in seconds. Defaults to 30.",
        kind: ParameterType::Integer,
        required: false,
        enum_values: None,
    },
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_OUTPUT_CHARS: usize = 50_000;
/// Raw bytes kept per stream; formatting truncates to characters afterwards.
const CAPTURE_LIMIT_BYTES: usize = 4 * MAX_OUTPUT_CHARS;

/// Runs a command through the user's login shell.
pub struct ShellTool {
    shell: String,
}

impl ShellTool {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its output. Runs via the user's login shell."
    }

    fn parameters(&self) -> &[ToolParameter] {
        PARAMETERS
    }

    #[instrument(skip_all, fields(shell = %self.shell))]
    fn execute(&self, args: &ToolArgs) -> ToolResult {
        let command = match required_str(args, "command") {
            Ok(command) => command.trim(),
            Err(missing) => return missing,
        };
        if command.is_empty() {
            return ToolResult::failure("Command cannot be empty.");
        }
        let timeout_secs = match args.get("timeout") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(value) => match value.as_i64().and_then(|secs| u64::try_from(secs).ok()) {
                Some(secs) if secs > 0 => secs,
                _ => return ToolResult::failure("Timeout must be a positive integer."),
            },
        };

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-l").arg("-c").arg(command);
        let output = match run_isolated_command(
            cmd,
            Duration::from_secs(timeout_secs),
            CAPTURE_LIMIT_BYTES,
        ) {
            Ok(output) => output,
            Err(err) => return ToolResult::failure(format!("Failed to launch process: {err:#}")),
        };
        debug!(
            exit_code = output.exit_code(),
            timed_out = output.timed_out,
            "shell command finished"
        );
        ToolResult::success(format_output(&output, timeout_secs))
    }
}

/// Combine captured streams, timeout marker, and exit code into one text block.
fn format_output(output: &CommandOutput, timeout_secs: u64) -> String {
    let mut parts = Vec::new();

    let stdout = output.stdout_lossy();
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        parts.push(stdout.to_string());
    }
    let stderr = output.stderr_lossy();
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        parts.push(format!("[stderr]\n{stderr}"));
    }
    if parts.is_empty() {
        parts.push("(no output)".to_string());
    }
    if output.timed_out {
        parts.push(format!("[timed out after {timeout_secs}s]"));
    }
    parts.push(format!("[exit code: {}]", output.exit_code()));

    truncate_chars(
        &parts.join("\n\n"),
        MAX_OUTPUT_CHARS,
        &format!("\n\n[Truncated: output exceeded {MAX_OUTPUT_CHARS} characters]"),
    )
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::ToolValue;

    fn run(command: &str, timeout: Option<i64>) -> ToolResult {
        let mut args = ToolArgs::new();
        args.insert("command".to_string(), ToolValue::String(command.to_string()));
        if let Some(secs) = timeout {
            args.insert("timeout".to_string(), ToolValue::Integer(secs));
        }
        ShellTool::new("/bin/sh").execute(&args)
    }

    #[test]
    fn echo_returns_output_and_exit_code() {
        let result = run("echo hello world", None);
        assert!(!result.is_error);
        assert_eq!(result.content, "hello world\n\n[exit code: 0]");
    }

    #[test]
    fn missing_command_reports_stderr_and_127() {
        let result = run("definitely-not-a-real-command-xyz", None);
        assert!(!result.is_error);
        assert!(result.content.contains("[stderr]"));
        assert!(result.content.ends_with("[exit code: 127]"));
    }

    #[test]
    fn quiet_command_reports_no_output() {
        let result = run("true", None);
        assert_eq!(result.content, "(no output)\n\n[exit code: 0]");
    }

    #[test]
    fn nonzero_exit_is_still_success() {
        let result = run("echo oops >&2; exit 3", None);
        assert!(!result.is_error);
        assert_eq!(result.content, "[stderr]\noops\n\n[exit code: 3]");
    }

    #[test]
    fn timeout_stops_command_and_is_reported() {
        let started = std::time::Instant::now();
        let result = run("echo started; sleep 30", Some(1));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(result.content.starts_with("started"));
        assert!(result.content.contains("[timed out after 1s]"));
        assert!(result.content.contains("[exit code: "));
    }

    #[test]
    fn empty_command_is_rejected() {
        let result = run("   \n ", None);
        assert_eq!(result, ToolResult::failure("Command cannot be empty."));
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let result = run("echo hi", Some(0));
        assert_eq!(
            result,
            ToolResult::failure("Timeout must be a positive integer.")
        );
    }

    #[test]
    fn long_output_is_truncated() {
        let result = run("head -c 60000 /dev/zero | tr '\\0' 'a'", None);
        assert!(result.content.starts_with(&"a".repeat(MAX_OUTPUT_CHARS)));
        assert!(
            result
                .content
                .ends_with("[Truncated: output exceeded 50000 characters]")
        );
    }
}
