//! Bearer token persistence
//!
//! Provides pluggable persistence for the session token so it survives a
//! full client restart. `Session` keeps the in-memory copy and writes
//! through to a `CredentialStore`.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Trait for persisting the bearer token
pub trait CredentialStore: Send + Sync {
    /// Load the persisted token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Persist a token, replacing any previous one
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token
    fn remove(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    token: String,
}

/// JSON file-based credential store
///
/// Atomic writes via temp file + rename to prevent corruption.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a new file credential store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            ClientError::CredentialStore(format!(
                "Failed to read credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let stored: StoredCredentials = serde_json::from_str(&json).map_err(|e| {
            ClientError::CredentialStore(format!(
                "Failed to parse credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Credentials loaded");
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        let json = serde_json::to_string(&StoredCredentials {
            token: token.to_string(),
        })?;

        let tmp_path = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::CredentialStore(format!(
                    "Failed to create credential directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        std::fs::write(&tmp_path, json).map_err(|e| {
            ClientError::CredentialStore(format!(
                "Failed to write credential file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            ClientError::CredentialStore(format!(
                "Failed to rename credential file {} → {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::CredentialStore(format!(
                "Failed to remove credential file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-memory credential store
///
/// Lost on drop; used when no token path is configured and in tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: std::sync::RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    /// Store pre-seeded with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: std::sync::RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let token = self.token.read().map_err(|e| {
            ClientError::CredentialStore(format!("Failed to acquire credential lock: {}", e))
        })?;
        Ok(token.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut stored = self.token.write().map_err(|e| {
            ClientError::CredentialStore(format!("Failed to acquire credential lock: {}", e))
        })?;
        *stored = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut stored = self.token.write().map_err(|e| {
            ClientError::CredentialStore(format!("Failed to acquire credential lock: {}", e))
        })?;
        *stored = None;
        Ok(())
    }
}
