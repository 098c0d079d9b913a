//! Clipboard access for the clipboard tool.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;
use wait_timeout::ChildExt;

use crate::io::process::run_command_with_timeout;

const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(5);
const CLIPBOARD_READ_LIMIT: usize = 16 * 1024 * 1024;

/// Plain-text clipboard capability.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text; `None` when the clipboard holds no text.
    fn read_text(&self) -> Result<Option<String>>;
    /// Replace the clipboard contents with `text`.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// In-process clipboard. Used when no desktop clipboard is reachable, and in tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text: Mutex::new((!text.is_empty()).then_some(text)),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        Ok(self
            .text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) =
            (!text.is_empty()).then(|| text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    /// `pbpaste` / `pbcopy`.
    Pasteboard,
    /// `wl-paste` / `wl-copy`.
    Wayland,
    /// `xclip -selection clipboard`.
    X11,
}

impl Backend {
    fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Backend::Pasteboard
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Backend::Wayland
        } else {
            Backend::X11
        }
    }

    fn read_command(self) -> Command {
        match self {
            Backend::Pasteboard => Command::new("pbpaste"),
            Backend::Wayland => {
                let mut cmd = Command::new("wl-paste");
                cmd.arg("--no-newline");
                cmd
            }
            Backend::X11 => {
                let mut cmd = Command::new("xclip");
                cmd.args(["-selection", "clipboard", "-o"]);
                cmd
            }
        }
    }

    fn write_command(self) -> Command {
        match self {
            Backend::Pasteboard => Command::new("pbcopy"),
            Backend::Wayland => Command::new("wl-copy"),
            Backend::X11 => {
                let mut cmd = Command::new("xclip");
                cmd.args(["-selection", "clipboard", "-i"]);
                cmd
            }
        }
    }
}

/// Desktop clipboard reached through the platform's command-line utilities.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    backend: Backend,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            backend: Backend::detect(),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        let cmd = self.backend.read_command();
        let program = cmd.get_program().to_string_lossy().into_owned();
        let output = run_command_with_timeout(cmd, CLIPBOARD_TIMEOUT, CLIPBOARD_READ_LIMIT)
            .with_context(|| format!("run {program}"))?;
        if output.timed_out {
            bail!("{program} timed out");
        }
        if !output.status.success() {
            return Err(anyhow!(
                "{program} exited with code {}: {}",
                output.exit_code(),
                output.stderr_lossy().trim()
            ));
        }
        let text = String::from_utf8(output.stdout).context("clipboard text is not UTF-8")?;
        debug!(backend = ?self.backend, chars = text.chars().count(), "read clipboard");
        Ok((!text.is_empty()).then_some(text))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut cmd = self.backend.write_command();
        let program = cmd.get_program().to_string_lossy().into_owned();
        // Copy utilities may fork a daemon that holds the selection, so only stdin is piped.
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {program}"))?;
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("write to {program}")),
            None => Err(anyhow!("stdin was not piped")),
        };
        let status = match child
            .wait_timeout(CLIPBOARD_TIMEOUT)
            .with_context(|| format!("wait for {program}"))?
        {
            Some(status) => status,
            None => {
                child.kill().with_context(|| format!("kill {program}"))?;
                child.wait().with_context(|| format!("wait for {program}"))?;
                bail!("{program} timed out");
            }
        };
        written?;
        if !status.success() {
            bail!("{program} exited with {status}");
        }
        debug!(backend = ?self.backend, chars = text.chars().count(), "wrote clipboard");
        Ok(())
    }
}
