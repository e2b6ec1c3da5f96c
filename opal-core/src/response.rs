//! The response envelope.

use crate::body::{Body, BoxError};
use crate::context::Context;
use crate::error::ResponseError;
use crate::parse;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Header carrying a caller-supplied correlation id.
pub const OPAQUE_ID: &str = "x-opaque-id";

/// The raw HTTP response of a call.
///
/// Status and headers can be inspected any number of times. The body is
/// read at most once; after the dispatcher or [`Response::bytes`] read it,
/// the bytes stay available through [`Response::cached_body`].
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Body>,
    cached: Option<Bytes>,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Body) -> Self {
        Self {
            status,
            headers,
            body: Some(body),
            cached: None,
        }
    }

    /// Wrap an `http::Response`.
    pub fn from_http(response: http::Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.headers, body)
    }

    /// The status code.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// The status line, e.g. `"404 Not Found"`.
    pub fn status(&self) -> String {
        status_line(self.status.as_u16())
    }

    /// Whether the status is in the 4xx or 5xx class.
    pub fn is_error(&self) -> bool {
        (400..=599).contains(&self.status.as_u16())
    }

    /// Whether the status is in the 2xx class.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the server attached `Warning` headers.
    pub fn has_warnings(&self) -> bool {
        self.headers.contains_key(http::header::WARNING)
    }

    /// All `Warning` header values.
    pub fn warnings(&self) -> Vec<&str> {
        self.headers
            .get_all(http::header::WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The `X-Opaque-Id` echoed by the server.
    pub fn opaque_id(&self) -> Option<&str> {
        self.header(OPAQUE_ID)
    }

    /// Take the unread body. Returns `None` once it has been read or taken.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// The body bytes, if they have been read.
    pub fn cached_body(&self) -> Option<&Bytes> {
        self.cached.as_ref()
    }

    /// The cached body as text, if it has been read.
    pub fn text(&self) -> Option<String> {
        self.cached
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Read the body, caching it. Later calls return the cached bytes; a
    /// body taken with [`Response::take_body`] reads as empty.
    pub async fn bytes(&mut self) -> Result<Bytes, BoxError> {
        if let Some(bytes) = &self.cached {
            return Ok(bytes.clone());
        }
        let bytes = match self.body.take() {
            Some(body) => body.collect().await?,
            None => Bytes::new(),
        };
        self.cached = Some(bytes.clone());
        Ok(bytes)
    }

    /// Whether the unread body is missing or known to be empty.
    pub(crate) fn body_is_empty(&self) -> bool {
        self.body.as_ref().is_none_or(Body::is_empty)
    }

    /// Whether the body has neither been read nor taken.
    pub fn has_unread_body(&self) -> bool {
        self.body.is_some()
    }

    /// `"[<status>] <body>"`, reading the body if needed.
    pub async fn dump(&mut self) -> String {
        let body = match self.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => format!("<error reading response body: {e}>"),
        };
        format!("[{}] {}", self.status(), body)
    }

    /// The error carried by an error-class response, or `None`.
    ///
    /// Consumes the body; its bytes remain available through
    /// [`Response::cached_body`].
    pub async fn err(&mut self) -> Option<ResponseError> {
        if !self.is_error() {
            return None;
        }
        Some(parse::parse_error(self, &Context::background()).await)
    }
}

impl fmt::Display for Response {
    /// Renders `"[<status>] <body>"` when the body was read, otherwise the
    /// status alone. Never consumes the body.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.status())?;
        if let Some(bytes) = &self.cached {
            write!(f, " {}", String::from_utf8_lossy(bytes))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("cached", &self.cached.as_ref().map(Bytes::len))
            .finish()
    }
}

/// A typed response body together with its envelope.
#[derive(Debug)]
pub struct Reply<T> {
    /// The decoded body.
    pub body: T,
    /// The raw response.
    pub response: Response,
}

impl<T> Reply<T> {
    /// The raw response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Split into body and envelope.
    pub fn into_parts(self) -> (T, Response) {
        (self.body, self.response)
    }

    /// Discard the envelope.
    pub fn into_inner(self) -> T {
        self.body
    }
}

impl<T> Deref for Reply<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T> DerefMut for Reply<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.body
    }
}

/// Render `"<code> <reason>"`, or the bare code when it has no known reason.
pub fn status_line(code: u16) -> String {
    match reason_phrase(code) {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}

/// The reason phrase for a status code.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}
