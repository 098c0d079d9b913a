//! Pilot configuration stored under `<config dir>/pilot/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// File name of the companion tool server binary.
pub const TOOL_SERVER_BINARY: &str = "pilot-tools";

/// Pilot configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to values that
/// work with a stock agent CLI install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PilotConfig {
    /// Where sessions and tool history live. Defaults to `<data dir>/pilot`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    pub agent: AgentConfig,
    pub tools: ToolsConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Explicit agent executable; skips the install-location search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Model name passed through `--model`.
    pub model: String,

    /// Wall-clock budget for one agent invocation in seconds.
    pub timeout_secs: u64,

    /// Captured agent stdout/stderr beyond this many bytes is discarded.
    pub output_limit_bytes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            executable: None,
            model: "sonnet".to_string(),
            timeout_secs: 10 * 60,
            output_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path to the `pilot-tools` binary. Defaults to a sibling of the running executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_path: Option<PathBuf>,

    /// Shell used by the shell tool. Defaults to `$SHELL`, then `/bin/sh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    /// When false, notification requests are answered as denied.
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PilotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.agent.timeout_secs == 0 {
            return Err(anyhow!("agent.timeout_secs must be > 0"));
        }
        if self.agent.output_limit_bytes == 0 {
            return Err(anyhow!("agent.output_limit_bytes must be > 0"));
        }
        if self.agent.model.trim().is_empty() {
            return Err(anyhow!("agent.model must be non-empty"));
        }
        if let Some(shell) = &self.tools.shell
            && shell.trim().is_empty()
        {
            return Err(anyhow!("tools.shell must be non-empty when set"));
        }
        Ok(())
    }

    /// Directory holding the session store and tool history.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("pilot"))
            .ok_or_else(|| anyhow!("no data directory available; set data_dir in config"))
    }

    pub fn sessions_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("sessions.json"))
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("history.jsonl"))
    }

    /// Location of the companion tool server binary.
    pub fn tool_server_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.tools.server_path {
            return Ok(path.clone());
        }
        let exe = std::env::current_exe().context("locate current executable")?;
        let dir = exe
            .parent()
            .with_context(|| format!("executable has no parent {}", exe.display()))?;
        Ok(dir.join(TOOL_SERVER_BINARY))
    }

    /// Shell for the shell tool.
    pub fn shell(&self) -> String {
        self.tools
            .shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
}

/// Default config location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pilot").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PilotConfig::default()`.
pub fn load_config(path: &Path) -> Result<PilotConfig> {
    if !path.exists() {
        let cfg = PilotConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PilotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PilotConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
