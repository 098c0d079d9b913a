//! Helpers for running child processes with timeouts and bounded output.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How long pipe readers may keep draining after the child has exited.
const DRAIN_AFTER_EXIT: Duration = Duration::from_secs(2);
/// How long pipe readers may keep draining after a timeout kill.
const DRAIN_AFTER_KILL: Duration = Duration::from_millis(200);
/// How long a terminated process group gets before the leader is killed.
const TERM_GRACE: Duration = Duration::from_millis(200);

/// The child could not be started at all.
#[derive(Debug, Error)]
#[error("failed to spawn {program}")]
pub struct SpawnError {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn exit_code(&self) -> i32 {
        exit_code(&self.status)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Exit code of a finished process; signal deaths map to `128 + signal`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// On timeout only the direct child is killed.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    run(cmd, timeout, output_limit_bytes, false)
}

/// Like [`run_command_with_timeout`], but the child leads its own process group and a timeout
/// terminates the whole group, so grandchildren spawned through a shell are stopped as well.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_isolated_command(
    cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    run(cmd, timeout, output_limit_bytes, true)
}

fn run(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
    isolate: bool,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if isolate {
            cmd.process_group(0);
        }
    }

    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(program = %program, "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, program = %program, "failed to spawn command");
            return Err(SpawnError { program, source: e }.into());
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (tx, rx) = mpsc::channel();
    spawn_reader(stdout, Stream::Stdout, output_limit_bytes, tx.clone());
    spawn_reader(stderr, Stream::Stderr, output_limit_bytes, tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            terminate(&mut child, isolate)?
        }
    };

    let grace = if timed_out {
        DRAIN_AFTER_KILL
    } else {
        DRAIN_AFTER_EXIT
    };
    let captured = collect_output(&rx, grace);

    if captured.stdout_truncated > 0 || captured.stderr_truncated > 0 {
        warn!(
            stdout_truncated = captured.stdout_truncated,
            stderr_truncated = captured.stderr_truncated,
            "output truncated"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout: captured.stdout,
        stderr: captured.stderr,
        stdout_truncated: captured.stdout_truncated,
        stderr_truncated: captured.stderr_truncated,
        timed_out,
    })
}

fn terminate(child: &mut Child, isolate: bool) -> Result<ExitStatus> {
    if isolate && signal_group(child.id(), "TERM") {
        if let Some(status) = child
            .wait_timeout(TERM_GRACE)
            .context("wait for terminated command")?
        {
            return Ok(status);
        }
        signal_group(child.id(), "KILL");
    }
    if let Err(e) = child.kill() {
        warn!(err = %e, "kill command");
    }
    child.wait().context("wait command after kill")
}

/// Deliver `signal` to the process group led by `pid` via the `kill` utility.
fn signal_group(pid: u32, signal: &str) -> bool {
    let result = Command::new("kill")
        .arg(format!("-{signal}"))
        .arg("--")
        .arg(format!("-{pid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match result {
        Ok(status) => status.success(),
        Err(e) => {
            warn!(err = %e, pid, signal, "failed to signal process group");
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

struct Chunk {
    stream: Stream,
    data: Vec<u8>,
    dropped: usize,
}

#[derive(Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdout_truncated: usize,
    stderr_truncated: usize,
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: R,
    stream: Stream,
    limit: usize,
    tx: Sender<Chunk>,
) {
    thread::spawn(move || {
        if let Err(e) = read_stream_limited(reader, stream, limit, &tx) {
            warn!(err = %e, ?stream, "read output");
        }
    });
}

fn read_stream_limited<R: Read>(
    mut reader: R,
    stream: Stream,
    limit: usize,
    tx: &Sender<Chunk>,
) -> Result<()> {
    let mut kept = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(kept));
        kept += keep;
        let sent = tx.send(Chunk {
            stream,
            data: chunk[..keep].to_vec(),
            dropped: n - keep,
        });
        if sent.is_err() {
            // Collector gave up waiting; nothing left to deliver to.
            break;
        }
    }

    Ok(())
}

/// Gather chunks until both readers finish or `grace` elapses.
fn collect_output(rx: &Receiver<Chunk>, grace: Duration) -> Captured {
    let deadline = Instant::now() + grace;
    let mut captured = Captured::default();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => captured.push(chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                while let Ok(chunk) = rx.try_recv() {
                    captured.push(chunk);
                }
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "output pipes still open after grace period"
                );
                break;
            }
        }
    }

    captured
}

impl Captured {
    fn push(&mut self, chunk: Chunk) {
        match chunk.stream {
            Stream::Stdout => {
                self.stdout.extend_from_slice(&chunk.data);
                self.stdout_truncated += chunk.dropped;
            }
            Stream::Stderr => {
                self.stderr.extend_from_slice(&chunk.data);
                self.stderr_truncated += chunk.dropped;
            }
        }
    }
}
