//! Tool execution records: append-only JSONL files and their importer.
//!
//! The protocol server appends one line per tool call. After an agent run the
//! assistant imports the file (which deletes it) and forwards the records to
//! the host's history log.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::types::ToolExecutionRecord;

/// Destination for tool execution records.
pub trait ExecutionLogSink {
    fn record(&self, record: &ToolExecutionRecord) -> Result<()>;
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardLog;

impl ExecutionLogSink for DiscardLog {
    fn record(&self, _record: &ToolExecutionRecord) -> Result<()> {
        Ok(())
    }
}

/// Append-only JSONL file, one record per line.
#[derive(Debug, Clone)]
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append_all(&self, records: &[ToolExecutionRecord]) -> Result<()> {
        records.iter().try_for_each(|record| self.record(record))
    }
}

impl ExecutionLogSink for JsonlLog {
    fn record(&self, record: &ToolExecutionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log dir {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(record).context("serialize execution record")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open execution log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append execution log {}", self.path.display()))?;
        debug!(tool = %record.tool_name, path = %self.path.display(), "recorded tool execution");
        Ok(())
    }
}

/// Read every well-formed record from `path`; malformed lines are skipped.
///
/// A missing file yields no records.
pub fn read_log(path: &Path) -> Result<Vec<ToolExecutionRecord>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("read execution log {}", path.display()));
        }
    };

    let mut records = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ToolExecutionRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(line = idx + 1, err = %e, "skipping malformed execution record"),
        }
    }
    Ok(records)
}

/// Read all records from `path`, then delete the file.
pub fn import_log(path: &Path) -> Result<Vec<ToolExecutionRecord>> {
    let records = read_log(path)?;
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("remove execution log {}", path.display()));
        }
    }
    debug!(count = records.len(), path = %path.display(), "imported execution log");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(tool: &str, is_error: bool) -> ToolExecutionRecord {
        ToolExecutionRecord {
            tool_name: tool.to_string(),
            arguments_json: r#"{"action":"read"}"#.to_string(),
            result_content: "done".to_string(),
            is_error,
            executed_at: Utc::now(),
            duration_ms: 5,
        }
    }

    #[test]
    fn appends_one_line_per_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/tools.jsonl");
        let log = JsonlLog::new(&path);
        log.record(&record("clipboard", false)).expect("first");
        log.record(&record("web", true)).expect("second");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents.lines().count(), 2);

        let records = read_log(&path).expect("read log");
        assert_eq!(records[0].tool_name, "clipboard");
        assert!(records[1].is_error);
    }

    #[test]
    fn import_skips_malformed_lines_and_deletes_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tools.jsonl");
        let good = serde_json::to_string(&record("shell", false)).expect("serialize");
        fs::write(&path, format!("{good}\nnot json\n{{\"toolName\":\"x\"}}\n\n{good}\n"))
            .expect("write");

        let records = import_log(&path).expect("import");
        assert_eq!(records.len(), 2);
        assert!(!path.exists());
    }

    #[test]
    fn import_of_missing_file_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let records = import_log(&temp.path().join("absent.jsonl")).expect("import");
        assert!(records.is_empty());
    }
}
