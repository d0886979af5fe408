//! JSON file store for baselines, one document per user.
//!
//! Saves carry the `updatedAt` the caller last read; a mismatch with what is
//! on disk is reported as a conflict instead of silently losing an update.
//! A per-user lock file is held from that check until the new document is in
//! place, so concurrent writers (threads or processes) are serialized.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::EmotionalBaseline;

const LOCK_ATTEMPTS: u32 = 200;
const LOCK_RETRY: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid baseline document: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored baseline changed since the caller read it
    #[error("baseline for user {user_id} was modified concurrently")]
    Conflict { user_id: String },

    /// Another writer kept the user's lock for the whole retry window
    #[error("baseline lock {} is held by another writer", .0.display())]
    Locked(PathBuf),
}

/// Exclusive per-user lock, released on drop.
struct UserLock {
    path: PathBuf,
}

impl UserLock {
    fn acquire(path: PathBuf) -> Result<Self, StoreError> {
        for _ in 0..LOCK_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => thread::sleep(LOCK_RETRY),
                Err(e) => return Err(e.into()),
            }
        }
        warn!(path = %path.display(), "gave up waiting for baseline lock");
        Err(StoreError::Locked(path))
    }
}

impl Drop for UserLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[derive(Debug, Clone)]
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user_id)))
    }

    fn lock_path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", file_stem(user_id)))
    }

    pub fn load(&self, user_id: &str) -> Result<Option<EmotionalBaseline>, StoreError> {
        let path = self.path_for(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Persist `baseline`. `expected_updated_at` is `None` for a new record,
    /// otherwise the `updatedAt` of the version the caller started from.
    pub fn save(
        &self,
        baseline: &EmotionalBaseline,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let _lock = UserLock::acquire(self.lock_path_for(&baseline.user_id))?;

        let current = self.load(&baseline.user_id)?.map(|stored| stored.updated_at);
        if current != expected_updated_at {
            warn!(
                user_id = %baseline.user_id,
                ?current,
                ?expected_updated_at,
                "rejecting stale baseline write"
            );
            return Err(StoreError::Conflict {
                user_id: baseline.user_id.clone(),
            });
        }

        let path = self.path_for(&baseline.user_id);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string_pretty(baseline)?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), "saved baseline");
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<String>, StoreError> {
        let mut users = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let baseline: EmotionalBaseline = serde_json::from_str(&content)?;
            users.push(baseline.user_id);
        }
        users.sort();
        Ok(users)
    }
}

/// Keep ASCII alphanumerics, `-` and `_`; hex-escape everything else.
fn file_stem(user_id: &str) -> String {
    let mut stem = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02x}"));
        }
    }
    stem
}
