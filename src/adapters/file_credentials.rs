//! File-based credentials provider adapter.
//!
//! Wraps [`CredentialsManager`] to implement the [`CredentialsProvider`]
//! trait. Credentials are stored in `~/.ledger/.credentials.json`.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::auth::{Credentials, CredentialsManager};
use crate::traits::{CredentialsError, CredentialsProvider};

/// File-based credentials provider.
#[derive(Debug)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    /// Create a new file-based credentials provider.
    ///
    /// # Returns
    /// The provider, or an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, CredentialsError> {
        CredentialsManager::new()
            .map(|manager| Self { manager })
            .ok_or_else(|| {
                CredentialsError::Other("Failed to determine home directory".to_string())
            })
    }

    /// Create a provider backed by an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            manager: CredentialsManager::with_path(path),
        }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        let creds = self.manager.load();
        if creds.is_empty() {
            Ok(None)
        } else {
            Ok(Some(creds))
        }
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        if self.manager.save(creds) {
            Ok(())
        } else {
            Err(CredentialsError::SaveFailed(
                "Failed to write credentials file".to_string(),
            ))
        }
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        if self.manager.clear() {
            Ok(())
        } else {
            Err(CredentialsError::ClearFailed(
                "Failed to delete credentials file".to_string(),
            ))
        }
    }
}
