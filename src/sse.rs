//! SSE (Server-Sent Events) record assembly and payload classification.
//!
//! The backend streams AI responses as blank-line-delimited SSE records:
//! - `data: {"type":"delta","content":"..."}` - incremental text
//! - `data: {"type":"done"}` - normal completion
//! - `data: {"type":"error","message":"..."}` - server-reported failure
//!
//! A `data:` payload that is not valid JSON is treated as a raw delta
//! fragment, not as an error. Lines without the `data:` prefix are ignored.
//!
//! This module is pure and synchronous; the async read loop lives in
//! [`crate::stream`].

use serde_json::Value;
use thiserror::Error;

/// Prefix marking a semantically meaningful SSE line.
pub const DATA_PREFIX: &str = "data:";

/// Fallback message for an `error` record that carries no usable text.
pub const GENERIC_SERVER_ERROR: &str = "server reported an error";

/// A classified application event decoded from one `data:` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A text fragment to append to the accumulating result.
    Delta(String),
    /// Normal stream completion; no further records are expected.
    Done,
    /// A server-reported failure.
    Error { message: String },
}

/// The raw content of one `data:` line.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    /// Structured payload, to be classified via [`classify`].
    Json(Value),
    /// Non-JSON payload, dispatched verbatim as a delta fragment.
    Raw(String),
}

/// Parse one line of a record.
///
/// Returns `None` for lines that are not `data:` lines or whose remainder
/// is empty after trimming.
pub fn parse_data_line(line: &str) -> Option<DataPayload> {
    let rest = line.trim().strip_prefix(DATA_PREFIX)?;
    let data = rest.trim();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(data) {
        Ok(value) => Some(DataPayload::Json(value)),
        // Non-JSON frame: treat as plain text increment.
        Err(_) => Some(DataPayload::Raw(data.to_string())),
    }
}

/// Classify a structured payload by its `type` discriminator.
///
/// Returns `None` for unknown types and for a `delta` without a string
/// `content` field; such payloads are observed via `on_event` but never
/// dispatched as control-flow events.
pub fn classify(value: &Value) -> Option<ChatEvent> {
    match value.get("type").and_then(Value::as_str) {
        Some("delta") => value
            .get("content")
            .and_then(Value::as_str)
            .map(|content| ChatEvent::Delta(content.to_string())),
        Some("done") => Some(ChatEvent::Done),
        Some("error") => {
            // An empty message string counts as absent, like a missing field.
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .or_else(|| {
                    value
                        .get("content")
                        .and_then(Value::as_str)
                        .filter(|m| !m.is_empty())
                })
                .unwrap_or(GENERIC_SERVER_ERROR)
                .to_string();
            Some(ChatEvent::Error { message })
        }
        _ => None,
    }
}

/// A byte sequence that can never become valid UTF-8, no matter what
/// arrives next.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid UTF-8 in stream at byte offset {valid_up_to}")]
pub struct InvalidUtf8 {
    pub valid_up_to: usize,
}

/// Streaming byte-to-text decoder.
///
/// A multi-byte code point split across two chunks is carried forward and
/// completed by the next `decode` call; only a definitively invalid
/// sequence is an error.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, prepending any incomplete suffix from the
    /// previous call.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, InvalidUtf8> {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing code point: keep it for the next chunk.
                let valid = e.valid_up_to();
                self.carry = bytes.split_off(valid);
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(e) => Err(InvalidUtf8 {
                valid_up_to: e.valid_up_to(),
            }),
        }
    }

    /// Whether a partial code point is being carried.
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }
}

/// Buffer that assembles decoded text into blank-line-delimited records.
///
/// A record is only released once its terminating blank line has been
/// observed; trailing text without a terminator stays buffered (and is
/// dropped at end of stream by the caller).
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buffer: String,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text to the pending buffer.
    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Slice off the next complete record, if its separator has arrived.
    ///
    /// Both `\n\n` and `\r\n\r\n` separators are accepted, since some
    /// server stacks emit carriage-return-terminated lines.
    pub fn next_record(&mut self) -> Option<String> {
        let (pos, len) = self.find_boundary()?;
        let record = self.buffer[..pos].to_string();
        self.buffer.drain(..pos + len);
        Some(record)
    }

    /// Whether unterminated text remains buffered.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn find_boundary(&self) -> Option<(usize, usize)> {
        let lf = self.buffer.find("\n\n").map(|pos| (pos, 2));
        let crlf = self.buffer.find("\r\n\r\n").map(|pos| (pos, 4));
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
            (a, b) => a.or(b),
        }
    }
}
