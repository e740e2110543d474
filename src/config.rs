//! Client configuration.

/// Default backend origin when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Versioned API prefix appended to the base origin.
pub const API_PREFIX: &str = "/api/v1";

/// Environment variable overriding the backend origin.
pub const BASE_URL_ENV: &str = "LEDGER_API_BASE_URL";

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend origin, without the API prefix (e.g. `https://ledger.example.com`).
    pub base_url: String,
}

impl Config {
    /// Create a configuration with an explicit base URL.
    ///
    /// A trailing slash is stripped so path concatenation stays uniform.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Create a configuration from the environment, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    /// Build the full URL for an API path (e.g. `/expenses`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
