//! Process-wide session credential
//!
//! `Session` is the single accessor for the bearer token: one in-memory
//! cache kept in sync with a durable `CredentialStore`. Every outbound call
//! reads it at dispatch time.

use crate::credentials::{CredentialStore, MemoryCredentialStore};
use crate::error::{ClientError, Result};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Shared session state
pub struct Session {
    token: RwLock<Option<String>>,
    store: Arc<dyn CredentialStore>,
}

impl Session {
    /// Load the token from the store; the cache starts empty if loading fails
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored credentials, starting signed out");
                None
            }
        };
        Self {
            token: RwLock::new(token),
            store,
        }
    }

    /// Session backed only by memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::default()))
    }

    /// Current token, if any
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Whether a token is present
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Store a new token in memory and in the durable store
    pub fn set(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(ClientError::CredentialStore(
                "Refusing to store an empty token".to_string(),
            ));
        }
        self.store.save(&token)?;
        let mut cached = self.token.write().map_err(|e| {
            ClientError::CredentialStore(format!("Failed to acquire session lock: {}", e))
        })?;
        *cached = Some(token);
        Ok(())
    }

    /// Forget the token
    ///
    /// The in-memory copy is always dropped, even when the durable store
    /// fails to remove its copy; that failure is still returned.
    pub fn clear(&self) -> Result<()> {
        {
            let mut cached = self.token.write().unwrap_or_else(|e| e.into_inner());
            *cached = None;
        }
        self.store.remove()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.get().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let session = Session::in_memory();
        assert!(!session.is_present());

        session.set("tok-1").unwrap();
        assert_eq!(session.get().as_deref(), Some("tok-1"));

        session.clear().unwrap();
        assert!(session.get().is_none());
    }

    #[test]
    fn test_loads_token_from_store() {
        let store = Arc::new(MemoryCredentialStore::with_token("persisted"));
        let session = Session::new(store);
        assert_eq!(session.get().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_write_through_to_store() {
        let store = Arc::new(MemoryCredentialStore::default());
        let session = Session::new(store.clone());

        session.set("tok").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok"));

        session.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_survives_reload_with_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let first = Session::new(Arc::new(crate::credentials::FileCredentialStore::new(&path)));
        first.set("durable").unwrap();
        drop(first);

        let second = Session::new(Arc::new(crate::credentials::FileCredentialStore::new(&path)));
        assert_eq!(second.get().as_deref(), Some("durable"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let session = Session::in_memory();
        assert!(session.set("").is_err());
        assert!(!session.is_present());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::in_memory();
        session.set("super-secret").unwrap();
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
