//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! buffered or streaming responses for testing purposes, and records
//! every request for verification.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response, StreamingResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST/PUT requests)
    pub body: Option<String>,
}

/// Shape of a configured streaming response.
#[derive(Debug, Clone, Default)]
pub struct StreamSpec {
    status: u16,
    chunks: Vec<Result<Bytes, HttpError>>,
    body_missing: bool,
    hold_open: bool,
    connect_delay: bool,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Return an error
    Error(HttpError),
    /// Return a streaming response
    Stream(StreamSpec),
}

impl MockResponse {
    /// A streaming response with the given status and body chunks.
    pub fn stream(status: u16, chunks: Vec<Result<Bytes, HttpError>>) -> Self {
        MockResponse::Stream(StreamSpec {
            status,
            chunks,
            ..StreamSpec::default()
        })
    }

    /// A streaming response whose body is not readable.
    pub fn stream_without_body(status: u16) -> Self {
        MockResponse::Stream(StreamSpec {
            status,
            body_missing: true,
            ..StreamSpec::default()
        })
    }

    /// After the configured chunks, keep the stream open forever
    /// (simulates a stalled server).
    pub fn hold_open(mut self) -> Self {
        if let MockResponse::Stream(spec) = &mut self {
            spec.hold_open = true;
        }
        self
    }

    /// Never complete the connect phase (the request future stays pending).
    pub fn connect_delay(mut self) -> Self {
        if let MockResponse::Stream(spec) = &mut self {
            spec.connect_delay = true;
        }
        self
    }
}

/// Mock HTTP client for testing.
///
/// Responses are configured per exact URL; requests are recorded for
/// later verification.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL (matched exactly).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn response_for(&self, url: &str) -> Result<MockResponse, HttpError> {
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::Other(format!("no mock response configured for {}", url)))
    }

    fn buffered(&self, url: &str) -> Result<Response, HttpError> {
        match self.response_for(url)? {
            MockResponse::Success(response) => Ok(response),
            MockResponse::Error(e) => Err(e),
            MockResponse::Stream(_) => Err(HttpError::Other(
                "stream response configured for buffered request".to_string(),
            )),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        self.buffered(url)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));
        self.buffered(url)
    }

    async fn put(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("PUT", url, headers, Some(body.to_string()));
        self.buffered(url)
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("DELETE", url, headers, None);
        self.buffered(url)
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));

        let spec = match self.response_for(url)? {
            MockResponse::Stream(spec) => spec,
            MockResponse::Success(response) => {
                // Convenience: a buffered response becomes a one-chunk stream.
                return Ok(StreamingResponse {
                    status: response.status,
                    body: Some(Box::pin(stream::iter(vec![Ok(response.body)]))),
                });
            }
            MockResponse::Error(e) => return Err(e),
        };

        if spec.connect_delay {
            futures::future::pending::<()>().await;
        }

        if spec.body_missing {
            return Ok(StreamingResponse {
                status: spec.status,
                body: None,
            });
        }

        let chunks = stream::iter(spec.chunks);
        let body: crate::traits::ByteStream = if spec.hold_open {
            Box::pin(chunks.chain(stream::pending()))
        } else {
            Box::pin(chunks)
        };

        Ok(StreamingResponse {
            status: spec.status,
            body: Some(body),
        })
    }
}
