//! Local keyed persistence for the session history and the single
//! "current session" pointer.
//!
//! Two JSON documents live under the data directory: `sessions.json` (the
//! ordered history) and `current-session.json` (present only while a session
//! is active). Every mutation is written to disk before the call returns, so
//! callers always observe their own writes. Corrupt or unreadable documents
//! degrade to an empty result instead of failing.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use anyhow::{Context, Result};
use log::warn;

use crate::models::Session;

const SESSIONS_KEY: &str = "sessions.json";
const CURRENT_SESSION_KEY: &str = "current-session.json";

pub struct SessionStore {
    sessions_path: PathBuf,
    current_path: PathBuf,
    sessions: RwLock<Vec<Session>>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let sessions_path = data_dir.join(SESSIONS_KEY);
        let current_path = data_dir.join(CURRENT_SESSION_KEY);

        let sessions = load_or_empty::<Vec<Session>>(&sessions_path).unwrap_or_default();
        let current = load_or_empty::<Session>(&current_path);

        Ok(Self {
            sessions_path,
            current_path,
            sessions: RwLock::new(sessions),
            current: RwLock::new(current),
        })
    }

    /// Full session history in insertion order.
    pub fn all(&self) -> Vec<Session> {
        self.sessions.read().unwrap().clone()
    }

    /// Upsert by id: replaces an existing record or appends a new one.
    pub fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self.sessions.write().unwrap();
        match guard.iter_mut().find(|existing| existing.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => guard.push(session.clone()),
        }
        persist(&self.sessions_path, &*guard)
    }

    /// Remove by id. Deleting an absent id leaves the store unchanged.
    pub fn delete(&self, session_id: &str) -> Result<()> {
        let mut guard = self.sessions.write().unwrap();
        let before = guard.len();
        guard.retain(|session| session.id != session_id);
        if guard.len() == before {
            return Ok(());
        }
        persist(&self.sessions_path, &*guard)
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().unwrap().clone()
    }

    /// Statistics derived from the full history as of now.
    pub fn stats(&self) -> crate::stats::SessionStats {
        crate::stats::session_stats(&self.all())
    }

    /// Set or clear the current-session pointer. Clearing removes the key.
    pub fn set_current(&self, session: Option<&Session>) -> Result<()> {
        let mut guard = self.current.write().unwrap();
        match session {
            Some(session) => {
                persist(&self.current_path, session)?;
                *guard = Some(session.clone());
            }
            None => {
                if let Err(err) = fs::remove_file(&self.current_path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        return Err(err).with_context(|| {
                            format!("failed to remove {}", self.current_path.display())
                        });
                    }
                }
                *guard = None;
            }
        }
        Ok(())
    }
}

fn load_or_empty<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Discarding malformed record at {}: {err}", path.display());
            None
        }
    }
}

fn persist<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))
}
