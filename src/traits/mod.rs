//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP operations (GET, POST, PUT, DELETE, streaming)
//! - [`CredentialsProvider`] - credential storage and retrieval
//! - [`SessionNavigator`] - session-expiry redirection

pub mod credentials;
pub mod http;
pub mod navigation;

pub use credentials::{CredentialsError, CredentialsProvider};
pub use http::{ByteStream, Headers, HttpClient, HttpError, Response, StreamingResponse};
pub use navigation::SessionNavigator;
