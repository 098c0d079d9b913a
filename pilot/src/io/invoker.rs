//! Invoker abstraction for agent subprocess calls.
//!
//! The [`Invoker`] trait decouples the assistant from the actual agent
//! backend (the `claude` CLI). Tests use scripted invokers that return
//! predetermined payloads without spawning processes.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::core::error::AgentError;
use crate::io::process::{SpawnError, run_command_with_timeout};
use crate::io::resolver::ExecutableResolver;

/// Set by the agent inside its own sessions; a child agent that sees it refuses to start.
pub const NESTED_SESSION_ENV: &str = "CLAUDECODE";

/// Captured output of a successful (zero exit) agent run.
#[derive(Debug, Clone, Default)]
pub struct InvocationOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Abstraction over agent execution backends.
pub trait Invoker {
    /// Run the agent once with `args`. Each call owns its own process.
    fn invoke(&self, args: &[String]) -> Result<InvocationOutput, AgentError>;
}

/// Invoker that spawns the resolved agent executable.
#[derive(Debug)]
pub struct CliInvoker {
    resolver: ExecutableResolver,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CliInvoker {
    pub fn new(resolver: ExecutableResolver, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            resolver,
            timeout,
            output_limit_bytes,
        }
    }
}

impl Invoker for CliInvoker {
    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs(), args = args.len()))]
    fn invoke(&self, args: &[String]) -> Result<InvocationOutput, AgentError> {
        let program = self.resolver.resolve()?;
        info!(program = %program.display(), "starting agent");

        let mut cmd = Command::new(&program);
        cmd.args(args).env_remove(NESTED_SESSION_ENV);

        let output = match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) => output,
            Err(err) if err.downcast_ref::<SpawnError>().is_some() => {
                warn!(err = %format!("{err:#}"), "agent could not be spawned");
                return Err(AgentError::ExecutableNotFound);
            }
            Err(err) => return Err(AgentError::Io(err.context("run agent"))),
        };

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "agent timed out");
            return Err(AgentError::TimedOut {
                secs: whole_secs_rounded_up(self.timeout),
            });
        }

        let stderr = output.stderr_lossy();
        if !output.status.success() {
            let code = output.exit_code();
            warn!(exit_code = code, "agent failed");
            return Err(AgentError::ProcessExitedWithError { code, stderr });
        }

        debug!(stdout_bytes = output.stdout.len(), "agent completed successfully");
        Ok(InvocationOutput {
            stdout: output.stdout,
            stderr,
        })
    }
}

fn whole_secs_rounded_up(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn fake_agent(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("fake-agent");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn invoker(path: PathBuf) -> CliInvoker {
        CliInvoker::new(
            ExecutableResolver::with_override(path),
            Duration::from_secs(10),
            1_000_000,
        )
    }

    #[test]
    fn captures_stdout_and_passes_arguments() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), r#"printf '%s|' "$@""#);

        let output = invoker(agent)
            .invoke(&["-p".to_string(), "hello world".to_string(), String::new()])
            .expect("invoke");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "-p|hello world||");
    }

    #[test]
    fn strips_nested_session_variable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(
            temp.path(),
            &format!(r#"printf '%s %s' "${{{NESTED_SESSION_ENV}:-unset}}" "${{PATH:+path-set}}""#),
        );

        let output = invoker(agent).invoke(&[]).expect("invoke");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "unset path-set");
    }

    #[test]
    fn nonzero_exit_carries_code_and_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), "echo 'bad model' >&2; exit 2");

        let err = invoker(agent).invoke(&[]).unwrap_err();
        match err {
            AgentError::ProcessExitedWithError { code, stderr } => {
                assert_eq!(code, 2);
                assert_eq!(stderr.trim(), "bad model");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unspawnable_executable_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = temp.path().join("broken-agent");
        // Executable bit set but no valid interpreter.
        fs::write(&agent, "#!/nonexistent/interpreter\n").expect("write");
        fs::set_permissions(&agent, fs::Permissions::from_mode(0o755)).expect("chmod");

        let err = invoker(agent).invoke(&[]).unwrap_err();
        assert!(matches!(err, AgentError::ExecutableNotFound));
    }

    #[test]
    fn timeout_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), "exec sleep 30");
        let invoker = CliInvoker::new(
            ExecutableResolver::with_override(agent),
            Duration::from_millis(300),
            1024,
        );

        assert!(matches!(
            invoker.invoke(&[]).unwrap_err(),
            AgentError::TimedOut { secs: 1 }
        ));
    }

    #[test]
    fn reported_timeout_rounds_up_to_whole_seconds() {
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(300)), 1);
        assert_eq!(whole_secs_rounded_up(Duration::from_secs(600)), 600);
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(1500)), 2);
    }
}
