//! Credential slot and the session context that owns it.
//!
//! There is exactly one active credential per session context. Views and the
//! guard receive the context explicitly; nothing reads ambient storage.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::guard::{Navigator, Surface};
use crate::validator::SessionState;

/// Fixed key of the credential slot.
pub const CREDENTIAL_KEY: &str = "jwt";

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential store is unavailable: {0}")]
    Unavailable(String),

    #[error("credential store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single named slot holding the raw session token.
///
/// The store enforces no expiry; that is the validator's job.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), CredentialStoreError>;
    fn remove(&self) -> Result<(), CredentialStoreError>;
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn get(&self) -> Option<String> {
        (**self).get()
    }

    fn set(&self, token: &str) -> Result<(), CredentialStoreError> {
        (**self).set(token)
    }

    fn remove(&self) -> Result<(), CredentialStoreError> {
        (**self).remove()
    }
}

/// In-memory slot for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.inner.read().ok()?.clone()
    }

    fn set(&self, token: &str) -> Result<(), CredentialStoreError> {
        let mut slot = self
            .inner
            .write()
            .map_err(|e| CredentialStoreError::Unavailable(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialStoreError> {
        let mut slot = self
            .inner
            .write()
            .map_err(|e| CredentialStoreError::Unavailable(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// File-backed slot: one file named [`CREDENTIAL_KEY`] inside `dir`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIAL_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                // An unreadable slot is an absent session.
                tracing::warn!("failed to read credential file {:?}: {err}", self.path);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

        // `mode` only applies when the file is created.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        file.write_all(token.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn remove(&self) -> Result<(), CredentialStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Session context shared by the guard and every view.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Context over a fresh in-memory slot.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCredentialStore::new()))
    }

    /// Current raw credential, if any.
    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    /// Session state derived from a single read of the slot.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        SessionState::derive(self.token().as_deref(), now)
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }

    /// Store a freshly issued credential, superseding any previous one.
    pub fn sign_in(&self, token: &str) -> Result<(), CredentialStoreError> {
        self.store.set(token)?;
        tracing::info!("session credential stored");
        Ok(())
    }

    /// Drop the credential and send the viewer to the login surface.
    pub fn sign_out(&self, navigator: &dyn Navigator) -> Result<(), CredentialStoreError> {
        self.store.remove()?;
        tracing::info!("session credential removed");
        navigator.redirect(Surface::Login.path());
        Ok(())
    }
}

impl core::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never print token material.
        f.debug_struct("SessionContext")
            .field("has_credential", &self.store.get().is_some())
            .finish()
    }
}
