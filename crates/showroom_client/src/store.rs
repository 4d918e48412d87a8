use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use client_logging::client_warn;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Access tokens live about an hour, refresh tokens and the cached user
/// record about a day, mirroring the server-issued lifetimes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
pub const USER_RECORD_TTL_SECS: i64 = 24 * 60 * 60;

const SESSION_FILENAME: &str = ".showroom_session.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(String),
}

/// The authenticated admin, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl UserRecord {
    /// Roles allowed to use the system-wide cancel surface.
    pub fn is_elevated(&self) -> bool {
        matches!(self.role.as_str(), "admin" | "superuser")
    }
}

/// Expiry-filtered read of the three credential entries.
///
/// The entries are only ever written together, but they age out
/// independently; any missing entry means the session is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserRecord>,
}

impl SessionSnapshot {
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.user.is_some()
    }
}

/// Persistent home of the credential pair plus user record.
///
/// Implementations must treat the three entries as one unit on write and
/// clear, and must hide entries whose expiry has passed on read.
pub trait SessionStore: Send + Sync {
    fn snapshot(&self, now_secs: i64) -> SessionSnapshot;
    fn put(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserRecord,
        now_secs: i64,
    ) -> Result<(), StoreError>;
    fn clear(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenEntry {
    value: String,
    expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UserEntry {
    value: UserRecord,
    expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PersistedSession {
    access_token: Option<TokenEntry>,
    refresh_token: Option<TokenEntry>,
    user: Option<UserEntry>,
}

impl PersistedSession {
    fn filled(access_token: &str, refresh_token: &str, user: &UserRecord, now_secs: i64) -> Self {
        Self {
            access_token: Some(TokenEntry {
                value: access_token.to_string(),
                expires_at: now_secs + ACCESS_TOKEN_TTL_SECS,
            }),
            refresh_token: Some(TokenEntry {
                value: refresh_token.to_string(),
                expires_at: now_secs + REFRESH_TOKEN_TTL_SECS,
            }),
            user: Some(UserEntry {
                value: user.clone(),
                expires_at: now_secs + USER_RECORD_TTL_SECS,
            }),
        }
    }

    fn snapshot(&self, now_secs: i64) -> SessionSnapshot {
        let live_token = |entry: &Option<TokenEntry>| {
            entry
                .as_ref()
                .filter(|e| e.expires_at > now_secs)
                .map(|e| e.value.clone())
        };
        SessionSnapshot {
            access_token: live_token(&self.access_token),
            refresh_token: live_token(&self.refresh_token),
            user: self
                .user
                .as_ref()
                .filter(|e| e.expires_at > now_secs)
                .map(|e| e.value.clone()),
        }
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<PersistedSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn snapshot(&self, now_secs: i64) -> SessionSnapshot {
        self.session.lock().expect("session lock").snapshot(now_secs)
    }

    fn put(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserRecord,
        now_secs: i64,
    ) -> Result<(), StoreError> {
        let mut session = self.session.lock().expect("session lock");
        *session = PersistedSession::filled(access_token, refresh_token, user, now_secs);
        Ok(())
    }

    fn clear(&self) {
        let mut session = self.session.lock().expect("session lock");
        *session = PersistedSession::default();
    }
}

/// RON file on disk, replaced atomically (temp file then rename) so a crash
/// can never leave a half-written credential pair behind.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Stores the session file under `state_dir`.
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            path: state_dir.join(SESSION_FILENAME),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> PersistedSession {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return PersistedSession::default();
            }
            Err(err) => {
                client_warn!("Failed to read session file {:?}: {}", self.path, err);
                return PersistedSession::default();
            }
        };

        match ron::from_str(&content) {
            Ok(session) => session,
            Err(err) => {
                client_warn!("Failed to parse session file {:?}: {}", self.path, err);
                PersistedSession::default()
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;

        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(session, pretty)
            .map_err(|err| StoreError::Encode(err.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn snapshot(&self, now_secs: i64) -> SessionSnapshot {
        self.load().snapshot(now_secs)
    }

    fn put(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserRecord,
        now_secs: i64,
    ) -> Result<(), StoreError> {
        self.save(&PersistedSession::filled(
            access_token,
            refresh_token,
            user,
            now_secs,
        ))
    }

    fn clear(&self) {
        // Best effort; a missing file already is the cleared state.
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                client_warn!("Failed to remove session file {:?}: {}", self.path, err);
            }
        }
    }
}
