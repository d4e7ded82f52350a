use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::store::models::{ChatSession, Message, SessionMap};
use crate::store::StoreError;

/// JSON file holding every session, rewritten in full after each turn.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole mapping. A missing file is an empty store.
    pub fn load(&self) -> Result<SessionMap, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No session file at {}, starting empty", self.path.display());
                return Ok(SessionMap::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let sessions: SessionMap =
            serde_json::from_slice(&data).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} session(s) from {}", sessions.len(), self.path.display());
        Ok(sessions)
    }

    /// Overwrites the file with the full mapping.
    ///
    /// The bytes land in a sibling `.tmp` file first and are renamed over the
    /// target, so a crash mid-write leaves the previous contents intact.
    pub fn save(&self, sessions: &SessionMap) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(sessions).map_err(StoreError::Encode)?;
        let temp_path = self.temp_path();

        {
            let mut file = File::create(&temp_path).map_err(|e| self.io_error(e))?;
            file.write_all(&data).map_err(|e| self.io_error(e))?;
            file.sync_all().map_err(|e| self.io_error(e))?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(e));
        }

        debug!("Saved {} session(s) to {}", sessions.len(), self.path.display());
        Ok(())
    }

    /// Finds or creates the session to chat in.
    ///
    /// An empty `requested_id` always creates a session under a fresh UUID
    /// that is not yet a key of `sessions`.
    pub fn resolve(sessions: &mut SessionMap, requested_id: &str) -> ChatSession {
        if !requested_id.is_empty() {
            if let Some(existing) = sessions.get(requested_id) {
                info!(
                    "Resuming session {} ({} messages)",
                    requested_id,
                    existing.messages.len()
                );
                return existing.clone();
            }

            info!("Creating session {}", requested_id);
            let session = ChatSession::new(requested_id);
            sessions.insert(session.id.clone(), session.clone());
            return session;
        }

        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        info!("Creating session {}", id);
        let session = ChatSession::new(id);
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Appends `message` to `session` and writes the session back into `sessions`.
    pub fn record(sessions: &mut SessionMap, session: &mut ChatSession, message: Message) {
        session.messages.push(message);
        sessions.insert(session.id.clone(), session.clone());
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
