//! Mock implementations for testing.
//!
//! Provides a scripted transport, an in-memory diagnostic sink, and JSON
//! fixtures for unit testing without making real API calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::REQUEST_ID_HEADER;
use crate::observability::{LogLevel, Logger};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, including any query string.
    pub path: String,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// When the transport received the request.
    pub at: Instant,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::raw(200, body).with_header("content-type", "application/json")
    }

    /// Creates a `{"data": value}` response.
    pub fn data<T: serde::Serialize>(value: &T) -> Self {
        Self::json(&serde_json::json!({ "data": value }))
    }

    /// Creates an EKDSend error envelope response.
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        let envelope = serde_json::json!({
            "error": {
                "message": message,
                "code": code
            }
        });
        Self::json(&envelope).with_status(status)
    }

    /// Creates a response with an empty body.
    pub fn empty(status: u16) -> Self {
        Self::raw(status, Vec::new())
    }

    /// Creates a response with an arbitrary body.
    pub fn raw(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds an `x-request-id` header.
    pub fn with_request_id(self, request_id: &str) -> Self {
        self.with_header(REQUEST_ID_HEADER, request_id)
    }
}

#[derive(Debug, Clone)]
enum MockOutcome {
    Response(MockResponse),
    Failure(TransportError),
}

/// Mock HTTP transport for testing.
///
/// Scripted outcomes are consumed in order; once the queue is empty the
/// default response is returned, or a 500 if none is set.
#[derive(Debug, Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.outcomes).push_back(MockOutcome::Response(response));
    }

    /// Queues a `{"data": value}` response.
    pub fn queue_data<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::data(value));
    }

    /// Queues an error envelope response.
    pub fn queue_error(&self, status: u16, code: &str, message: &str) {
        self.queue(MockResponse::error(status, code, message));
    }

    /// Queues a transport failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.outcomes).push_back(MockOutcome::Failure(error));
    }

    /// Sets the response returned once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns the gaps between consecutive requests.
    pub fn intervals(&self) -> Vec<Duration> {
        lock(&self.requests)
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }

    fn next_outcome(&self) -> MockOutcome {
        if let Some(outcome) = lock(&self.outcomes).pop_front() {
            return outcome;
        }

        let response = lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "MOCK_ERROR", "No mock response configured"));
        MockOutcome::Response(response)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            method: request.method,
            path: request.path,
            body: request.body,
            headers: request.headers,
            at: Instant::now(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_outcome() {
            MockOutcome::Response(response) => Ok(HttpResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
            }),
            MockOutcome::Failure(error) => Err(error),
        }
    }
}

/// Diagnostic sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded entries.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        lock(&self.entries).clone()
    }

    /// Returns recorded messages without their levels.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.entries)
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns true if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.entries)
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, _context: Option<&HashMap<String, String>>) {
        lock(&self.entries).push((level, message.to_string()));
    }
}

/// JSON fixtures shaped like EKDSend responses.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A queued email.
    pub fn email(id: &str) -> Value {
        json!({
            "id": id,
            "status": "queued",
            "from": "hello@example.com",
            "to": ["user@example.com"],
            "subject": "Welcome!",
            "html": "<h1>Welcome!</h1>",
            "created_at": "2024-01-15T10:30:00Z"
        })
    }

    /// A sent SMS.
    pub fn sms(id: &str) -> Value {
        json!({
            "id": id,
            "status": "sent",
            "to": "+15551234567",
            "from": "EKDSend",
            "message": "Your code is 1234",
            "segments": 1,
            "created_at": "2024-01-15T10:30:00Z",
            "sent_at": "2024-01-15T10:30:01Z"
        })
    }

    /// A queued voice call.
    pub fn call(id: &str) -> Value {
        json!({
            "id": id,
            "status": "queued",
            "to": "+15551234567",
            "from": "+15557654321",
            "tts_message": "Your verification code is 1 2 3 4",
            "voice": "alloy",
            "language": "en-US",
            "created_at": "2024-01-15T10:30:00Z"
        })
    }

    /// A call recording.
    pub fn recording() -> Value {
        json!({
            "url": "https://recordings.example.com/call_1.mp3",
            "duration": 42,
            "created_at": "2024-01-15T10:31:00Z"
        })
    }

    /// A list envelope.
    pub fn page(items: Vec<Value>, total: u64, limit: u64, offset: u64) -> Value {
        json!({
            "data": items,
            "total": total,
            "limit": limit,
            "offset": offset
        })
    }
}
