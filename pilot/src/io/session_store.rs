//! Session metadata storage (`<data dir>/sessions.json`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::Session;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    sessions: Vec<Session>,
}

/// File-backed store mapping local session ids to agent sessions.
///
/// Every mutation rewrites the file atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn create(&self, external_session_id: &str, name: &str, model: &str) -> Result<Session> {
        let mut file = self.load()?;
        let session = Session::new(external_session_id, name, model, Utc::now());
        file.sessions.push(session.clone());
        self.save(&file)?;
        debug!(id = %session.id, "created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.load()?.sessions.into_iter().find(|s| s.id == id))
    }

    /// All sessions, most recently used first.
    pub fn all(&self) -> Result<Vec<Session>> {
        let mut sessions = self.load()?.sessions;
        sessions.sort_by_key(|s| std::cmp::Reverse(s.last_used_at()));
        Ok(sessions)
    }

    pub fn most_recent(&self) -> Result<Option<Session>> {
        Ok(self.all()?.into_iter().next())
    }

    /// Mark a session as used now.
    pub fn touch(&self, id: &str) -> Result<Session> {
        let mut file = self.load()?;
        let session = file
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("session not found: {id}"))?;
        session.touch(Utc::now());
        let touched = session.clone();
        self.save(&file)?;
        Ok(touched)
    }

    /// Remove a session. Returns false when no session had that id.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut file = self.load()?;
        let before = file.sessions.len();
        file.sessions.retain(|s| s.id != id);
        if file.sessions.len() == before {
            return Ok(false);
        }
        self.save(&file)?;
        Ok(true)
    }

    /// Pick the session to continue: an explicit id, else the most recent one.
    pub fn resolve(&self, id: Option<&str>) -> Result<Session> {
        match id {
            Some(id) => self
                .get(id)?
                .ok_or_else(|| anyhow!("session not found: {id}")),
            None => self.most_recent()?.ok_or_else(|| {
                anyhow!("no sessions exist yet; start one with `pilot session start`")
            }),
        }
    }

    fn load(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read sessions {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parse sessions {}", self.path.display()))
    }

    fn save(&self, file: &SessionFile) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(file)?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("sessions path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp sessions {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace sessions {}", path.display()))?;
    Ok(())
}
