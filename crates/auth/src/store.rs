//! Durable storage for the bearer token

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::AuthError;

/// Key the token is stored under
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Somewhere the session token survives between runs
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, AuthError>;
    async fn save(&self, token: &str) -> Result<(), AuthError>;
    async fn clear(&self) -> Result<(), AuthError>;
}

/// Token kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a token, as if it had been persisted by an earlier run
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, AuthError> {
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    async fn save(&self, token: &str) -> Result<(), AuthError> {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// Token persisted as a small JSON document on disk
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, AuthError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::storage(e)),
        };

        let stored: StoredToken = serde_json::from_slice(&raw).map_err(AuthError::storage)?;
        if stored.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(stored.token))
    }

    async fn save(&self, token: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(AuthError::storage)?;
            }
        }

        let body = serde_json::to_vec(&StoredToken {
            token: token.to_string(),
        })
        .map_err(AuthError::storage)?;

        tokio::fs::write(&self.path, body)
            .await
            .map_err(AuthError::storage)?;
        debug!("Persisted token to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::storage(e)),
        }
    }
}
