//! Concrete implementations of the trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileCredentialsProvider`] - file-based credential storage
//!
//! # Mock implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - configurable HTTP responses and streams
//! - [`mock::InMemoryCredentials`] - in-memory credential storage
//! - [`mock::MockNavigator`] - records login redirects

pub mod file_credentials;
pub mod mock;
pub mod reqwest_http;

pub use file_credentials::FileCredentialsProvider;
pub use mock::{InMemoryCredentials, MockHttpClient, MockNavigator};
pub use reqwest_http::ReqwestHttpClient;
