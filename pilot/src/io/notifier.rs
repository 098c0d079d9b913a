//! Desktop notification delivery for the notification tool.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::io::process::run_command_with_timeout;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a delivery attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    /// Notifications are not permitted; an expected state, not a fault.
    Denied,
}

/// Notification capability.
pub trait Notifier: Send + Sync {
    fn send(&self, title: &str, body: &str) -> Result<NotificationOutcome>;
}

/// Posts notifications via `osascript` on macOS and `notify-send` elsewhere.
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    enabled: bool,
}

impl SystemNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn command(title: &str, body: &str) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(body),
                applescript_escape(title)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--").arg(title).arg(body);
            cmd
        }
    }
}

impl Notifier for SystemNotifier {
    fn send(&self, title: &str, body: &str) -> Result<NotificationOutcome> {
        if !self.enabled {
            info!("notifications disabled by configuration");
            return Ok(NotificationOutcome::Denied);
        }

        let cmd = Self::command(title, body);
        let program = cmd.get_program().to_string_lossy().into_owned();
        let output = run_command_with_timeout(cmd, NOTIFY_TIMEOUT, 64 * 1024)
            .with_context(|| format!("run {program}"))?;
        if output.timed_out {
            return Err(anyhow!("{program} timed out"));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "{program} exited with code {}: {}",
                output.exit_code(),
                output.stderr_lossy().trim()
            ));
        }
        debug!(program = %program, "notification delivered");
        Ok(NotificationOutcome::Delivered)
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
