//! Authenticated session state with file-backed persistence.
//!
//! The backend issues a bearer token at login; it is kept in memory for
//! request signing and mirrored to a small JSON file so the cashier stays
//! logged in across app restarts. A missing or corrupt file simply means
//! logged out. The token is wiped from memory when the session ends.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::error::PosError;

/// What a successful login leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// In-memory session plus its on-disk mirror.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<SessionData>,
}

impl SessionStore {
    /// Opens the store at `path`, restoring any persisted session. A file
    /// that is missing or does not parse leaves the store logged out.
    pub fn open(path: PathBuf) -> Self {
        let current = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<SessionData>(&raw) {
                Ok(data) => {
                    debug!(username = %data.username, "restored persisted session");
                    Some(data)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "session file unreadable; starting logged out");
                    None
                }
            },
            Err(_) => None,
        };
        Self { path, current }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.username.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.user_id.as_str())
    }

    /// Stores a fresh session and persists it.
    pub fn set_session(&mut self, data: SessionData) -> Result<(), PosError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PosError::Storage(format!("create session dir: {e}")))?;
        }
        let text = serde_json::to_string_pretty(&data)
            .map_err(|e| PosError::Storage(format!("serialize session: {e}")))?;
        fs::write(&self.path, text)
            .map_err(|e| PosError::Storage(format!("write session file: {e}")))?;
        self.current = Some(data);
        Ok(())
    }

    /// Explicit logout. Wipes the token and removes the session file.
    pub fn clear(&mut self) -> Result<(), PosError> {
        self.wipe_memory();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PosError::Storage(format!("remove session file: {e}"))),
        }
    }

    /// Token purge on a 401. Best-effort: the caller is already surfacing
    /// an auth error, so a disk hiccup here is logged, not propagated.
    pub fn purge(&mut self) {
        self.wipe_memory();
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "could not remove session file during purge");
            }
        }
    }

    fn wipe_memory(&mut self) {
        if let Some(mut data) = self.current.take() {
            data.token.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionData {
        SessionData {
            token: "tok-abc".to_string(),
            username: "kasir1".to_string(),
            user_id: "7".to_string(),
        }
    }

    #[test]
    fn set_session_persists_and_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(path.clone());
        assert!(!store.is_authenticated());
        store.set_session(session()).expect("persist session");
        assert!(store.is_authenticated());
        assert_eq!(store.token(), Some("tok-abc"));

        let reopened = SessionStore::open(path);
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.username(), Some("kasir1"));
        assert_eq!(reopened.user_id(), Some("7"));
    }

    #[test]
    fn clear_removes_the_file_and_logs_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(path.clone());
        store.set_session(session()).expect("persist session");
        store.clear().expect("clear session");
        assert!(!store.is_authenticated());
        assert!(!path.exists());

        // Clearing an already-clear store is fine.
        store.clear().expect("second clear");
    }

    #[test]
    fn purge_is_silent_even_without_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = SessionStore::open(dir.path().join("session.json"));
        store.set_session(session()).expect("persist session");
        store.purge();
        assert!(!store.is_authenticated());
        store.purge();
    }

    #[test]
    fn corrupt_session_file_starts_logged_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").expect("write corrupt file");

        let store = SessionStore::open(path);
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn session_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("deep").join("session.json");

        let mut store = SessionStore::open(path.clone());
        store.set_session(session()).expect("persist session");
        assert!(path.exists());
    }

    #[test]
    fn session_file_uses_the_legacy_key_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(path.clone());
        store.set_session(session()).expect("persist session");

        let raw = std::fs::read_to_string(&path).expect("read back");
        let v: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(v["userId"], "7");
        assert_eq!(v["username"], "kasir1");
    }
}
