//! Credential storage for the ledger client.
//!
//! Tokens are stored in `~/.ledger/.credentials.json`. The login flow
//! writes them; the streaming decoder and API client only read the token
//! at request-issue time and clear it when the backend rejects it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

/// The credentials directory name.
const CREDENTIALS_DIR: &str = ".ledger";

/// The credentials file name.
const CREDENTIALS_FILE: &str = ".credentials.json";

/// Authentication credentials for the ledger backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    /// Bearer token for API authentication.
    pub token: Option<String>,
    /// The authenticated user profile, as returned by the login endpoint.
    pub user: Option<Value>,
}

impl Credentials {
    /// Create new empty credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create credentials holding just a bearer token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    /// Check if a bearer token is present.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Check if anything is stored at all.
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Manages credential storage and retrieval on disk.
#[derive(Debug)]
pub struct CredentialsManager {
    /// Path to the credentials file.
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a new CredentialsManager rooted in the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        let credentials_path = home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE);
        Some(Self { credentials_path })
    }

    /// Create a manager with an explicit file path (used in tests).
    pub fn with_path(credentials_path: PathBuf) -> Self {
        Self { credentials_path }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        &self.credentials_path
    }

    /// Load credentials from the credentials file.
    ///
    /// Returns default credentials if the file doesn't exist or can't be read.
    pub fn load(&self) -> Credentials {
        if !self.credentials_path.exists() {
            return Credentials::default();
        }

        let Ok(file) = File::open(&self.credentials_path) else {
            return Credentials::default();
        };
        serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
    }

    /// Save credentials to the credentials file.
    ///
    /// Returns `true` on success.
    pub fn save(&self, creds: &Credentials) -> bool {
        if let Some(parent) = self.credentials_path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return false;
            }
        }

        let Ok(file) = File::create(&self.credentials_path) else {
            return false;
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, creds).is_ok() && writer.flush().is_ok()
    }

    /// Delete the credentials file.
    ///
    /// Returns `true` on success; a missing file counts as success.
    pub fn clear(&self) -> bool {
        if !self.credentials_path.exists() {
            return true;
        }
        fs::remove_file(&self.credentials_path).is_ok()
    }
}
