//! Durable device-local persistence of the current session.
//!
//! Exactly one logical session exists per device. The token and the cached
//! identity projection are stored together in one document: both are written
//! together, cleared together, and both must be present for a hydrate to
//! succeed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Identity;

/// The persisted session: opaque token string plus cached identity projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: Identity,
}

/// Durable key-value persistence of the current session.
///
/// Persistence operations are asynchronous and awaited sequentially by the
/// controller; they are never issued concurrently for the same session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the session, overwriting any previous one
    async fn save(&self, session: &StoredSession) -> Result<()>;

    /// Load the persisted session, if any
    async fn load(&self) -> Result<Option<StoredSession>>;

    /// Remove the persisted session; a no-op when none exists
    async fn clear(&self) -> Result<()>;
}

/// File-backed session store: one JSON document on disk.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a half-written session behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(session)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredSession>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// In-memory session store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &StoredSession) -> Result<()> {
        *self.inner.lock().expect("session store lock poisoned") = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.inner.lock().expect("session store lock poisoned").clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.lock().expect("session store lock poisoned") = None;
        Ok(())
    }
}
