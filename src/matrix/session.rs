//! Persisted Matrix session.
//!
//! The data directory holds two entries:
//!
//! - `sqlite`: the SDK state store, encrypted with the account passphrase
//! - `session`: a JSON file with the login tokens and the last sync token

use std::path::{Path, PathBuf};

use log::{debug, trace};
use matrix_sdk::authentication::matrix;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// On-disk content of the `session` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    user_session: matrix::MatrixSession,

    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Session files of the bot account.
#[derive(Clone)]
pub struct SessionStore {
    stored: Option<StoredSession>,
    sqlite_path: PathBuf,
    session_path: PathBuf,
}

impl SessionStore {
    /// Opens the session stored in `dir_path`. A missing or unreadable
    /// session file means the bot has to log in again.
    pub async fn open(dir_path: &str) -> SessionStore {
        let dir = Path::new(dir_path);
        let sqlite_path = dir.join("sqlite");
        let session_path = dir.join("session");

        let stored = match fs::read_to_string(&session_path).await {
            Ok(content) => serde_json::from_str(&content).ok(),
            Err(_) => None,
        };
        debug!(
            "session at {}: {}",
            session_path.display(),
            if stored.is_some() { "found" } else { "none" }
        );

        SessionStore {
            stored,
            sqlite_path,
            session_path,
        }
    }

    pub fn has_session(&self) -> bool {
        self.stored.is_some()
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn user_session(&self) -> Option<&matrix::MatrixSession> {
        self.stored.as_ref().map(|s| &s.user_session)
    }

    pub fn sync_token(&self) -> Option<String> {
        self.stored.as_ref().and_then(|s| s.sync_token.clone())
    }

    /// Writes the login tokens of a fresh login, dropping any sync token.
    pub async fn save_user_session(
        &self,
        user_session: &matrix::MatrixSession,
    ) -> anyhow::Result<()> {
        trace!("saving user session");

        let stored = StoredSession {
            user_session: user_session.clone(),
            sync_token: None,
        };
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;
        Ok(())
    }

    /// Updates the sync token of the session file.
    pub async fn save_sync_token(&self, sync_token: String) -> anyhow::Result<()> {
        trace!("saving sync token {}", sync_token);

        let content = fs::read_to_string(&self.session_path).await?;
        let mut stored: StoredSession = serde_json::from_str(&content)?;
        stored.sync_token = Some(sync_token);
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;
        Ok(())
    }
}
