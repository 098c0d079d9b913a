//! Locating the agent executable on disk.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::core::error::AgentError;

/// Program name looked up on `PATH` when no candidate matches.
pub const AGENT_PROGRAM: &str = "claude";

/// Finds the agent executable once and remembers it for the life of the process.
///
/// The lock is held for the whole first resolution, so concurrent first callers
/// wait for one lookup instead of racing to populate the cache.
#[derive(Debug)]
pub struct ExecutableResolver {
    program: String,
    candidates: Vec<PathBuf>,
    cached: Mutex<Option<PathBuf>>,
}

impl ExecutableResolver {
    /// Resolver over the well-known install locations for the agent CLI.
    pub fn new() -> Self {
        Self::with_candidates(AGENT_PROGRAM, default_candidates())
    }

    /// Resolver that only accepts `path`, still checked for executability.
    pub fn with_override(path: PathBuf) -> Self {
        Self {
            program: path.display().to_string(),
            candidates: vec![path],
            cached: Mutex::new(None),
        }
    }

    pub fn with_candidates(program: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self {
            program: program.into(),
            candidates,
            cached: Mutex::new(None),
        }
    }

    pub fn resolve(&self) -> Result<PathBuf, AgentError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = cached.as_ref() {
            return Ok(path.clone());
        }

        let path = self.lookup().ok_or(AgentError::ExecutableNotFound)?;
        info!(path = %path.display(), "resolved agent executable");
        *cached = Some(path.clone());
        Ok(path)
    }

    fn lookup(&self) -> Option<PathBuf> {
        if let Some(found) = self.candidates.iter().find(|path| is_executable(path)) {
            return Some(found.clone());
        }
        debug!(program = %self.program, "no candidate matched, falling back to which");
        which(&self.program)
    }
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin").join(AGENT_PROGRAM));
    }
    candidates.push(Path::new("/usr/local/bin").join(AGENT_PROGRAM));
    candidates.push(Path::new("/opt/homebrew/bin").join(AGENT_PROGRAM));
    candidates
}

fn which(program: &str) -> Option<PathBuf> {
    let output = Command::new("which")
        .arg(program)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!(err = %e, "failed to run which");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!found.is_empty()).then(|| PathBuf::from(found))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use std::thread;

    fn write_executable(path: &Path) {
        fs::write(path, "#!/bin/sh\necho ok\n").expect("write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    #[test]
    fn first_executable_candidate_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing");
        let not_exec = temp.path().join("plain");
        fs::write(&not_exec, "data").expect("write");
        let good = temp.path().join("agent");
        write_executable(&good);

        let resolver = ExecutableResolver::with_candidates(
            "pilot-no-such-program",
            vec![missing, not_exec, good.clone()],
        );
        assert_eq!(resolver.resolve().expect("resolve"), good);
    }

    #[test]
    fn resolution_is_cached_after_first_success() {
        let temp = tempfile::tempdir().expect("tempdir");
        let good = temp.path().join("agent");
        write_executable(&good);

        let resolver = ExecutableResolver::with_override(good.clone());
        assert_eq!(resolver.resolve().expect("first"), good);

        fs::remove_file(&good).expect("remove");
        assert_eq!(resolver.resolve().expect("cached"), good);
    }

    #[test]
    fn falls_back_to_which() {
        let resolver = ExecutableResolver::with_candidates("sh", Vec::new());
        let path = resolver.resolve().expect("sh on PATH");
        assert!(path.ends_with("sh"));
    }

    #[test]
    fn reports_not_found() {
        let resolver =
            ExecutableResolver::with_candidates("pilot-no-such-program-xyz", Vec::new());
        assert!(matches!(
            resolver.resolve().unwrap_err(),
            AgentError::ExecutableNotFound
        ));
    }

    #[test]
    fn concurrent_first_use_agrees() {
        let temp = tempfile::tempdir().expect("tempdir");
        let good = temp.path().join("agent");
        write_executable(&good);
        let resolver = Arc::new(ExecutableResolver::with_override(good.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || resolver.resolve().expect("resolve"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("join"), good);
        }
    }
}
