//! Test doubles for the trait abstractions.

pub mod credentials;
pub mod http;
pub mod navigator;

pub use credentials::InMemoryCredentials;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use navigator::MockNavigator;
