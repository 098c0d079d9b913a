//! Tool-config file that tells the agent how to spawn the companion server.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use tempfile::TempDir;
use tracing::debug;

use crate::core::args::TOOL_SERVER_NAME;

/// A freshly written tool-config file plus the execution log path it names.
///
/// Both live in a private temporary directory that is removed on drop.
#[derive(Debug)]
pub struct ToolConfigFile {
    _dir: TempDir,
    config_path: PathBuf,
    log_path: PathBuf,
}

impl ToolConfigFile {
    /// Write a config pointing the agent at `server_path`.
    pub fn write(server_path: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("pilot-tools-")
            .tempdir()
            .context("create tool config dir")?;
        let config_path = dir.path().join("mcp-config.json");
        let log_path = dir.path().join("executions.jsonl");

        let mut buf = serde_json::to_string_pretty(&render(server_path, &log_path))
            .context("serialize tool config")?;
        buf.push('\n');
        fs::write(&config_path, buf)
            .with_context(|| format!("write tool config {}", config_path.display()))?;
        debug!(path = %config_path.display(), "wrote tool config");

        Ok(Self {
            _dir: dir,
            config_path,
            log_path,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Tool-config JSON naming the companion server as a stdio process.
pub fn render(server_path: &Path, log_path: &Path) -> serde_json::Value {
    json!({
        "mcpServers": {
            TOOL_SERVER_NAME: {
                "type": "stdio",
                "command": server_path.display().to_string(),
                "args": ["--log-file", log_path.display().to_string()],
            }
        }
    })
}
