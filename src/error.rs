//! Error types for the ledger client.

use thiserror::Error;

use crate::traits::{CredentialsError, HttpError};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for API client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Backend envelope reported a failure code.
    #[error("API error ({code}): {message}")]
    Api { code: i64, message: String },

    /// The stored credential was rejected; the session has been abandoned.
    #[error("session expired")]
    Unauthorized,

    /// Credential storage failed.
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),
}
