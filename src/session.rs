//! Explicit mailbox session and its on-disk store.
//!
//! Core operations never read this; a caller loads a [`Session`] and passes its
//! token into each call.

use crate::{Error, MailAccount, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

/// How long a stored session is reused before a new mailbox is created.
pub const SESSION_TTL: TimeDelta = TimeDelta::days(1);

/// One active mailbox plus the local expiry for reusing it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Full email address.
    pub email: String,
    /// Bearer token.
    pub token: String,
    /// After this instant the session is not resumed.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Start a session for `account` expiring after [`SESSION_TTL`].
    pub fn new(account: MailAccount) -> Self {
        Self::with_ttl(account, SESSION_TTL)
    }

    /// Start a session for `account` expiring after `ttl`.
    pub fn with_ttl(account: MailAccount, ttl: TimeDelta) -> Self {
        Self {
            email: account.email,
            token: account.token,
            expires_at: Utc::now() + ttl,
        }
    }

    /// `true` once the local expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `true` if the session is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The account this session was created for.
    pub fn account(&self) -> MailAccount {
        MailAccount {
            email: self.email.clone(),
            token: self.token.clone(),
        }
    }
}

/// Single-session JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/mailtm-client/session.json`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or(Error::NoConfigDir)?;
        Ok(Self::new(dir.join("mailtm-client").join("session.json")))
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session.
    ///
    /// Returns `None` when there is no file or the session has expired. An expired
    /// file is removed.
    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let session: Session = serde_json::from_slice(&raw)?;
        if session.is_expired() {
            log::debug!("stored session for {} expired", session.email);
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Persist `session`, replacing any previous one.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    /// Remove the stored session. Missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
