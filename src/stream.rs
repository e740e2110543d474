//! Streaming response decoder for POST-initiated SSE exchanges.
//!
//! [`StreamDecoder::start`] issues the request on a spawned task and
//! returns a [`CancelHandle`] synchronously. The read loop decodes bytes
//! to text, assembles blank-line-delimited records, and dispatches one
//! callback invocation per `data:` line, in arrival order. Exactly one
//! terminal outcome is surfaced per connection: `on_done`, `on_error`, or
//! silence (cancellation and the authentication-redirect path).

use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::sse::{classify, parse_data_line, ChatEvent, DataPayload, RecordBuffer, Utf8Decoder};
use crate::traits::{
    CredentialsProvider, Headers, HttpClient, HttpError, SessionNavigator, StreamingResponse,
};

/// Fallback message for a transport failure with no usable text.
pub const GENERIC_STREAM_ERROR: &str = "stream connection error";

/// Callback set for one streaming exchange.
///
/// All callbacks are optional. `on_event` observes every successfully
/// parsed JSON payload regardless of type and does not affect control
/// flow; the other three follow the record classification.
#[derive(Default)]
pub struct StreamHandlers {
    on_event: Option<Box<dyn FnMut(&Value) + Send>>,
    on_delta: Option<Box<dyn FnMut(&str) + Send>>,
    on_done: Option<Box<dyn FnMut() + Send>>,
    on_error: Option<Box<dyn FnMut(&str) + Send>>,
}

impl StreamHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe every parsed JSON payload (observability hook).
    pub fn on_event(mut self, f: impl FnMut(&Value) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(f));
        self
    }

    /// Receive incremental text fragments.
    pub fn on_delta(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_delta = Some(Box::new(f));
        self
    }

    /// Receive the normal-completion signal.
    pub fn on_done(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }

    /// Receive the terminal failure message.
    pub fn on_error(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn emit_event(&mut self, value: &Value) {
        if let Some(f) = self.on_event.as_mut() {
            f(value);
        }
    }

    fn emit_delta(&mut self, text: &str) {
        if let Some(f) = self.on_delta.as_mut() {
            f(text);
        }
    }

    fn emit_done(&mut self) {
        debug!("stream completed");
        if let Some(f) = self.on_done.as_mut() {
            f();
        }
    }

    fn emit_error(&mut self, message: &str) {
        let message = if message.is_empty() {
            GENERIC_STREAM_ERROR
        } else {
            message
        };
        error!(message, "stream failed");
        if let Some(f) = self.on_error.as_mut() {
            f(message);
        }
    }
}

impl std::fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_event", &self.on_event.is_some())
            .field("on_delta", &self.on_delta.is_some())
            .field("on_done", &self.on_done.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Handle to cancel an in-flight streaming exchange.
///
/// Cancellation aborts the decode task at its next await point; no
/// callback fires afterwards, including `on_error`. Calling `cancel` any
/// number of times is safe.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    abort: AbortHandle,
}

impl CancelHandle {
    /// Abort the underlying exchange. Idempotent.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether the exchange has finished (completed, failed, or aborted).
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Drives one POST-initiated SSE exchange end-to-end.
pub struct StreamDecoder<H, C, N> {
    config: Config,
    http: Arc<H>,
    credentials: Arc<C>,
    navigator: Arc<N>,
}

impl<H, C, N> Clone for StreamDecoder<H, C, N> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            http: Arc::clone(&self.http),
            credentials: Arc::clone(&self.credentials),
            navigator: Arc::clone(&self.navigator),
        }
    }
}

impl<H, C, N> StreamDecoder<H, C, N>
where
    H: HttpClient + 'static,
    C: CredentialsProvider + 'static,
    N: SessionNavigator + 'static,
{
    pub fn new(config: Config, http: Arc<H>, credentials: Arc<C>, navigator: Arc<N>) -> Self {
        Self {
            config,
            http,
            credentials,
            navigator,
        }
    }

    /// Start a streaming exchange against `base + /api/v1 + path`.
    ///
    /// Returns the cancel handle synchronously, before any response data
    /// arrives. Must be called from within a tokio runtime.
    pub fn start<P: Serialize>(
        &self,
        path: &str,
        payload: &P,
        handlers: StreamHandlers,
    ) -> CancelHandle {
        let url = self.config.api_url(path);
        let body = serde_json::to_string(payload);
        let http = Arc::clone(&self.http);
        let credentials = Arc::clone(&self.credentials);
        let navigator = Arc::clone(&self.navigator);

        let task = tokio::spawn(async move {
            let mut handlers = handlers;
            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    handlers.emit_error(&e.to_string());
                    return;
                }
            };
            run_exchange(http, credentials, navigator, &url, &body, &mut handlers).await;
        });

        CancelHandle {
            abort: task.abort_handle(),
        }
    }
}

/// Outcome of processing one record.
#[derive(Debug, PartialEq)]
enum Dispatch {
    Continue,
    Terminal,
}

async fn run_exchange<H, C, N>(
    http: Arc<H>,
    credentials: Arc<C>,
    navigator: Arc<N>,
    url: &str,
    body: &str,
    handlers: &mut StreamHandlers,
) where
    H: HttpClient,
    C: CredentialsProvider,
    N: SessionNavigator,
{
    let token = match credentials.load().await {
        Ok(creds) => creds.and_then(|c| c.token),
        Err(e) => {
            // An unreadable store is treated as an absent token.
            warn!(error = %e, "could not read stored credentials");
            None
        }
    };

    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Accept".to_string(), "text/event-stream".to_string());
    if let Some(token) = token {
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    }

    debug!(url, "starting SSE exchange");

    let response = match http.post_stream(url, body, &headers).await {
        Ok(response) => response,
        Err(HttpError::Cancelled) => return,
        Err(e) => {
            handlers.emit_error(&e.to_string());
            return;
        }
    };

    if response.status == 401 {
        // Full-session abort: no callback fires on this path.
        warn!("credential rejected, redirecting to login");
        if let Err(e) = credentials.clear().await {
            warn!(error = %e, "failed to clear rejected credentials");
        }
        navigator.go_to_login();
        return;
    }

    let StreamingResponse { status, body } = response;
    if !(200..300).contains(&status) {
        handlers.emit_error(&format!("request failed: {}", status));
        return;
    }
    let Some(mut byte_stream) = body else {
        handlers.emit_error(&format!("request failed: {}", status));
        return;
    };

    let mut decoder = Utf8Decoder::new();
    let mut records = RecordBuffer::new();

    while let Some(next) = byte_stream.next().await {
        let chunk = match next {
            Ok(chunk) => chunk,
            Err(HttpError::Cancelled) => return,
            Err(e) => {
                handlers.emit_error(&e.to_string());
                return;
            }
        };

        let text = match decoder.decode(&chunk) {
            Ok(text) => text,
            Err(e) => {
                handlers.emit_error(&e.to_string());
                return;
            }
        };
        records.push(&text);

        while let Some(record) = records.next_record() {
            if dispatch_record(&record, handlers) == Dispatch::Terminal {
                return;
            }
        }
    }

    // End of stream: an unterminated trailing record cannot be confirmed
    // complete and is dropped without notification.
    if records.has_partial() {
        debug!("dropping unterminated trailing record");
    }
}

/// Process one record: each `data:` line is dispatched independently.
fn dispatch_record(record: &str, handlers: &mut StreamHandlers) -> Dispatch {
    for line in record.lines() {
        let Some(payload) = parse_data_line(line) else {
            continue;
        };
        match payload {
            DataPayload::Json(value) => {
                handlers.emit_event(&value);
                match classify(&value) {
                    Some(ChatEvent::Delta(text)) => handlers.emit_delta(&text),
                    Some(ChatEvent::Done) => {
                        handlers.emit_done();
                        return Dispatch::Terminal;
                    }
                    Some(ChatEvent::Error { message }) => {
                        handlers.emit_error(&message);
                        return Dispatch::Terminal;
                    }
                    None => {}
                }
            }
            DataPayload::Raw(text) => handlers.emit_delta(&text),
        }
    }
    Dispatch::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryCredentials, MockHttpClient, MockNavigator, MockResponse};
    use crate::auth::Credentials;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const STREAM_URL: &str = "http://localhost:8080/api/v1/ai-chat";

    /// Collects callback invocations for assertions.
    #[derive(Default)]
    struct Recorder {
        deltas: Mutex<Vec<String>>,
        events: Mutex<Vec<Value>>,
        errors: Mutex<Vec<String>>,
        done: AtomicUsize,
    }

    fn handlers(recorder: &Arc<Recorder>) -> StreamHandlers {
        let deltas = Arc::clone(recorder);
        let events = Arc::clone(recorder);
        let errors = Arc::clone(recorder);
        let done = Arc::clone(recorder);
        StreamHandlers::new()
            .on_delta(move |text| deltas.deltas.lock().unwrap().push(text.to_string()))
            .on_event(move |value| events.events.lock().unwrap().push(value.clone()))
            .on_error(move |message| errors.errors.lock().unwrap().push(message.to_string()))
            .on_done(move || {
                done.done.fetch_add(1, Ordering::SeqCst);
            })
    }

    impl Recorder {
        fn deltas(&self) -> Vec<String> {
            self.deltas.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }

        fn done_count(&self) -> usize {
            self.done.load(Ordering::SeqCst)
        }

        fn event_count(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    struct Fixture {
        http: Arc<MockHttpClient>,
        credentials: Arc<InMemoryCredentials>,
        navigator: Arc<MockNavigator>,
        decoder: StreamDecoder<MockHttpClient, InMemoryCredentials, MockNavigator>,
    }

    fn fixture() -> Fixture {
        let http = Arc::new(MockHttpClient::new());
        let credentials = Arc::new(InMemoryCredentials::new());
        let navigator = Arc::new(MockNavigator::new());
        let decoder = StreamDecoder::new(
            Config::default(),
            Arc::clone(&http),
            Arc::clone(&credentials),
            Arc::clone(&navigator),
        );
        Fixture {
            http,
            credentials,
            navigator,
            decoder,
        }
    }

    fn chunks_of(parts: &[&[u8]]) -> Vec<Result<Bytes, HttpError>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect()
    }

    async fn wait_finished(handle: &CancelHandle) {
        for _ in 0..200 {
            if handle.is_finished() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stream task did not finish in time");
    }

    #[tokio::test]
    async fn test_single_chunk_stream() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"delta\",\"content\":\"Hello, \"}\n\n\
                      data: {\"type\":\"delta\",\"content\":\"world\"}\n\n\
                      data: {\"type\":\"done\"}\n\n",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({"q": 1}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["Hello, ", "world"]);
        assert_eq!(recorder.done_count(), 1);
        assert!(recorder.errors().is_empty());
        assert_eq!(recorder.event_count(), 3);
    }

    #[tokio::test]
    async fn test_ordering_preserved_across_arbitrary_chunk_splits() {
        // Same records as the single-chunk test, but the separator and a
        // multi-byte character are both split across chunk boundaries.
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"delta\",\"content\":\"caf",
                    &[0xC3], // first byte of U+00E9
                    &[0xA9],
                    b"\"}\n",
                    b"\ndata: {\"type\":\"delta\",\"content\":\"!\"}",
                    b"\n\ndata: {\"type\":\"done\"}\n\n",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["caf\u{e9}", "!"]);
        assert_eq!(recorder.done_count(), 1);
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_payload_is_raw_delta() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(200, chunks_of(&[b"data: hello world\n\n"])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["hello world"]);
        assert!(recorder.errors().is_empty());
        // Raw fallback is not a parsed payload, so on_event sees nothing.
        assert_eq!(recorder.event_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_data_lines_dispatch_independently() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"delta\",\"content\":\"a\"}\n\
                      data: {\"type\":\"delta\",\"content\":\"b\"}\n\n",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unterminated_trailing_record_is_dropped() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"delta\",\"content\":\"kept\"}\n\n\
                      data: {\"type\":\"delta\",\"content\":\"dropped\"}",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["kept"]);
        assert_eq!(recorder.done_count(), 0);
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_reports_once() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(500, chunks_of(&[b"ignored"])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.errors(), vec!["request failed: 500"]);
        assert!(recorder.deltas().is_empty());
        assert_eq!(recorder.done_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_body_reports_once() {
        let f = fixture();
        f.http
            .set_response(STREAM_URL, MockResponse::stream_without_body(200));

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.errors(), vec!["request failed: 200"]);
    }

    #[tokio::test]
    async fn test_transport_failure_mid_stream_reports_once() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                vec![
                    Ok(Bytes::from_static(
                        b"data: {\"type\":\"delta\",\"content\":\"x\"}\n\n",
                    )),
                    Err(HttpError::Io("connection reset".to_string())),
                ],
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.deltas(), vec!["x"]);
        assert_eq!(recorder.errors(), vec!["IO error: connection reset"]);
        assert_eq!(recorder.done_count(), 0);
    }

    #[tokio::test]
    async fn test_server_error_record() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[b"data: {\"type\":\"error\",\"message\":\"model unavailable\"}\n\n"]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.errors(), vec!["model unavailable"]);
        assert_eq!(recorder.done_count(), 0);
    }

    #[tokio::test]
    async fn test_terminal_exclusivity_done_then_error() {
        // A (misbehaving) server emitting an error record after done: the
        // stream stops at the first terminal event.
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"done\"}\n\n\
                      data: {\"type\":\"error\",\"message\":\"late\"}\n\n",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.done_count(), 1);
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_observed_but_not_dispatched() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[
                    b"data: {\"type\":\"ping\"}\n\n\
                      data: {\"type\":\"done\"}\n\n",
                ]),
            ),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.event_count(), 2);
        assert!(recorder.deltas().is_empty());
        assert_eq!(recorder.done_count(), 1);
    }

    #[tokio::test]
    async fn test_authentication_failure_redirects_silently() {
        let f = fixture();
        f.credentials
            .set_credentials(Some(Credentials::with_token("stale-token")));
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(401, chunks_of(&[b"unauthorized"])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert!(f.credentials.get_credentials().is_none());
        assert_eq!(f.navigator.login_redirects(), 1);
        assert!(recorder.deltas().is_empty());
        assert!(recorder.errors().is_empty());
        assert_eq!(recorder.done_count(), 0);
        assert_eq!(recorder.event_count(), 0);
    }

    #[tokio::test]
    async fn test_bearer_header_attached_when_token_present() {
        let f = fixture();
        f.credentials
            .set_credentials(Some(Credentials::with_token("tok-42")));
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(200, chunks_of(&[b"data: {\"type\":\"done\"}\n\n"])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        let requests = f.http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get("Authorization"),
            Some(&"Bearer tok-42".to_string())
        );
        assert_eq!(
            requests[0].headers.get("Accept"),
            Some(&"text/event-stream".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_bearer_header_without_token() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(200, chunks_of(&[b"data: {\"type\":\"done\"}\n\n"])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        let requests = f.http.get_requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_silences_callbacks() {
        let f = fixture();
        // One delta arrives, then the server stalls indefinitely.
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(
                200,
                chunks_of(&[b"data: {\"type\":\"delta\",\"content\":\"first\"}\n\n"]),
            )
            .hold_open(),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));

        // Let the first chunk arrive, then cancel twice.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
        handle.cancel();
        wait_finished(&handle).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(recorder.deltas(), vec!["first"]);
        assert!(recorder.errors().is_empty());
        assert_eq!(recorder.done_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_response() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(200, vec![]).hold_open().connect_delay(),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        handle.cancel();
        wait_finished(&handle).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(recorder.deltas().is_empty());
        assert!(recorder.errors().is_empty());
        assert_eq!(recorder.done_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_transport_failure() {
        let f = fixture();
        f.http.set_response(
            STREAM_URL,
            MockResponse::stream(200, chunks_of(&[&[b'a', 0xFF, b'b']])),
        );

        let recorder = Arc::new(Recorder::default());
        let handle = f
            .decoder
            .start("/ai-chat", &serde_json::json!({}), handlers(&recorder));
        wait_finished(&handle).await;

        assert_eq!(recorder.errors().len(), 1);
        assert!(recorder.errors()[0].contains("invalid UTF-8"));
    }
}
