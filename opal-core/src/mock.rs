//! In-memory transport for tests.
//!
//! Enabled with the `mock` feature.

use crate::body::Body;
use crate::context::Context;
use crate::error::TransportError;
use crate::transport::Transport;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// A request seen by a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Origin-form URI, e.g. `/movies/_doc/1?refresh=true`.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Collected request body.
    pub body: Bytes,
    /// Whether a [`Context`] was attached as an extension.
    pub had_context: bool,
}

impl RecordedRequest {
    /// The path component of the URI.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// The body as UTF-8 text.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The body parsed as JSON.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Clone)]
enum MockBody {
    Full(Bytes),
    None,
    Failing(String),
    Stalled,
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: MockBody,
}

impl MockResponse {
    /// A response with `status` and an empty body.
    ///
    /// # Panics
    ///
    /// Panics if `status` is not a valid status code.
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            headers: HeaderMap::new(),
            body: MockBody::Full(Bytes::new()),
        }
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = MockBody::Full(body.into());
        self
    }

    /// Set a JSON body and content type.
    pub fn json(self, value: serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Add a header.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is invalid.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(
            HeaderName::try_from(name).expect("invalid header name"),
            HeaderValue::try_from(value).expect("invalid header value"),
        );
        self
    }

    /// Respond without a body at all.
    pub fn no_body(mut self) -> Self {
        self.body = MockBody::None;
        self
    }

    /// Respond with a body stream that fails with `message`.
    pub fn failing_body(mut self, message: &str) -> Self {
        self.body = MockBody::Failing(message.to_string());
        self
    }

    /// Respond with a body stream that never yields.
    pub fn stalled_body(mut self) -> Self {
        self.body = MockBody::Stalled;
        self
    }

    fn into_http(self) -> http::Response<Body> {
        let body = match self.body {
            MockBody::Full(bytes) => Body::from(bytes),
            MockBody::None => Body::empty(),
            MockBody::Failing(message) => Body::from_stream(futures::stream::once(async move {
                Err::<Bytes, _>(std::io::Error::other(message))
            })),
            MockBody::Stalled => {
                Body::from_stream(futures::stream::pending::<Result<Bytes, std::io::Error>>())
            }
        };
        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<MockResponse, TransportError>>,
    requests: Vec<RecordedRequest>,
}

/// A transport that answers from a queue and records every request.
///
/// Clones share the same queue and log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// An empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay` before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response.
    pub fn push(&self, response: MockResponse) {
        self.state.lock().responses.push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.state.lock().responses.push_back(Err(error));
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.lock().requests.last().cloned()
    }

    /// Number of responses still queued.
    pub fn pending(&self) -> usize {
        self.state.lock().responses.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let body = body.collect().await.map_err(TransportError::Other)?;
        self.state.lock().requests.push(RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            had_context: parts.extensions.get::<Context>().is_some(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.state.lock().responses.pop_front();
        match next {
            Some(Ok(response)) => Ok(response.into_http()),
            Some(Err(error)) => Err(error),
            None => Err(TransportError::other("no mock response queued")),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockTransport")
            .field("queued", &state.responses.len())
            .field("recorded", &state.requests.len())
            .field("delay", &self.delay)
            .finish()
    }
}
