//! ledger-client - An async client for the ledger backend
//!
//! Typed API wrappers plus a streaming decoder for the AI endpoints,
//! which deliver their replies as server-sent events over POST.

pub mod adapters;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;
pub mod stream;
pub mod traits;

pub use api::ApiClient;
pub use auth::{Credentials, CredentialsManager};
pub use config::Config;
pub use error::{ClientError, Result};
pub use sse::ChatEvent;
pub use stream::{CancelHandle, StreamDecoder, StreamHandlers};
