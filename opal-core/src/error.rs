//! Error types for the dispatch pipeline.
//!
//! [`Error`] is the single error returned by the dispatcher. Variants that
//! can only occur after the server answered carry the response envelope, so
//! callers can still inspect the status, headers and raw body.

use crate::body::BoxError;
use crate::context::ContextError;
use crate::response::Response;
use http::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be built; nothing was sent.
    #[error("failed to build request: {0}")]
    Build(#[from] BuildError),

    /// The transport failed before producing a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server returned a structured error.
    #[error("{error}")]
    Server {
        /// The decoded error.
        error: ServerError,
        /// The response it was read from.
        response: Box<Response>,
    },

    /// The server returned a string-shaped error.
    #[error("{error}")]
    ServerString {
        /// The decoded error.
        error: StringError,
        /// The response it was read from.
        response: Box<Response>,
    },

    /// An error response could not be turned into a server error.
    #[error("{error}")]
    Local {
        /// What went wrong.
        error: LocalError,
        /// The response being handled.
        response: Box<Response>,
    },

    /// A successful response body could not be decoded.
    #[error("status: {}, failed to decode response body: {source}", .response.status_code().as_u16())]
    Decode {
        /// The JSON error.
        source: serde_json::Error,
        /// The response whose body failed to decode.
        response: Box<Response>,
    },

    /// The server returned an error status for an endpoint without a typed
    /// response.
    #[error("status: {}", .response.status())]
    Status {
        /// The error response, body unread.
        response: Box<Response>,
    },
}

impl Error {
    /// Attach a parsed response error to its envelope.
    pub fn from_response(error: ResponseError, response: Response) -> Self {
        let response = Box::new(response);
        match error {
            ResponseError::Server(error) => Self::Server { error, response },
            ResponseError::ServerString(error) => Self::ServerString { error, response },
            ResponseError::Local(error) => Self::Local { error, response },
        }
    }

    /// The response envelope, when the server answered.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Build(_) | Self::Transport(_) => None,
            Self::Server { response, .. }
            | Self::ServerString { response, .. }
            | Self::Local { response, .. }
            | Self::Decode { response, .. }
            | Self::Status { response } => Some(response),
        }
    }

    /// Take the response envelope out of the error.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Build(_) | Self::Transport(_) => None,
            Self::Server { response, .. }
            | Self::ServerString { response, .. }
            | Self::Local { response, .. }
            | Self::Decode { response, .. }
            | Self::Status { response } => Some(*response),
        }
    }

    /// The HTTP status, when the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(Response::status_code)
    }

    /// Whether the call was cut short by its [`Context`](crate::Context).
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_cancellation(),
            Self::Local { error, .. } => error.is_cancellation(),
            _ => false,
        }
    }

    /// The structured server error, if this is one.
    pub fn as_server_error(&self) -> Option<&ServerError> {
        match self {
            Self::Server { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Errors raised while building a request, before any I/O.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The assembled URI is malformed.
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// A header name is malformed.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// A header value is malformed.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// A required path part was empty.
    #[error("missing required path part: {0}")]
    MissingPart(&'static str),

    /// A path part was `.` or `..`, which URL resolution would collapse.
    #[error("invalid path part: {0}")]
    InvalidPart(&'static str),

    /// The request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The HTTP request could not be assembled.
    #[error("invalid request: {0}")]
    Http(#[from] http::Error),
}

/// Errors raised by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call's context was cancelled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The transport could not resolve the request URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The exchange timed out.
    #[error("request timed out: {0}")]
    Timeout(#[source] BoxError),

    /// The connection could not be established.
    #[error("connection error: {0}")]
    Connect(#[source] BoxError),

    /// Any other transport failure.
    #[error(transparent)]
    Other(BoxError),
}

impl TransportError {
    /// Wrap any error as a transport failure.
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Whether this failure came from the call's context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Context(_))
    }

    /// Whether the exchange timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Context(ContextError::DeadlineExceeded)
        )
    }
}

/// A structured error returned by the server.
///
/// Read from bodies shaped like
/// `{"error": {"type": .., "reason": .., "root_cause": [..]}, "status": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerError {
    /// HTTP status.
    pub status: u16,
    /// Error type, e.g. `index_not_found_exception`.
    pub error_type: String,
    /// Human-readable reason.
    pub reason: String,
    /// Index the error relates to.
    pub index: Option<String>,
    /// UUID of that index.
    pub index_uuid: Option<String>,
    /// Underlying causes reported by the server.
    pub root_causes: Vec<RootCause>,
    /// Nested cause, when the server reports one.
    pub caused_by: Option<Box<CausedBy>>,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {}", self.status)?;
        if !self.error_type.is_empty() {
            write!(f, ", type: {}", self.error_type)?;
        }
        if !self.reason.is_empty() {
            write!(f, ", reason: {}", self.reason)?;
        } else if let Some(cause) = self.root_causes.first() {
            write!(f, ", reason: {}", cause.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}

/// One entry of a server error's `root_cause` list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RootCause {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable reason.
    pub reason: String,
    /// Index the cause relates to.
    pub index: Option<String>,
    /// UUID of that index.
    pub index_uuid: Option<String>,
}

/// A nested `caused_by` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CausedBy {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable reason.
    pub reason: String,
    /// Further nested cause.
    pub caused_by: Option<Box<CausedBy>>,
}

/// A string-shaped error returned by the server, e.g. for 405 responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringError {
    /// HTTP status.
    pub status: u16,
    /// The server's message.
    pub message: String,
}

impl fmt::Display for StringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {}, error: {}", self.status, self.message)
    }
}

impl std::error::Error for StringError {}

/// Kinds of [`LocalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalErrorKind {
    /// The error response had no body.
    EmptyBody,
    /// Reading the body failed.
    ReadFailed,
    /// The body was not the expected JSON.
    DecodeFailed,
    /// The JSON carried none of the recognized error fields.
    UnknownShape,
}

impl LocalErrorKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::EmptyBody => "empty response body",
            Self::ReadFailed => "failed to read response body",
            Self::DecodeFailed => "failed to decode error response",
            Self::UnknownShape => "unrecognized error response",
        }
    }
}

/// A failure while handling a response that was not a transport failure.
#[derive(Debug)]
pub struct LocalError {
    /// HTTP status of the response being handled.
    pub status: u16,
    /// What went wrong.
    pub kind: LocalErrorKind,
    /// The underlying failure, if any.
    pub cause: Option<BoxError>,
}

impl LocalError {
    pub(crate) fn new(status: u16, kind: LocalErrorKind) -> Self {
        Self {
            status,
            kind,
            cause: None,
        }
    }

    pub(crate) fn with_cause(
        status: u16,
        kind: LocalErrorKind,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self {
            status,
            kind,
            cause: Some(cause.into()),
        }
    }

    /// Whether the body read was cut short by the call's context.
    pub fn is_cancellation(&self) -> bool {
        self.cause
            .as_ref()
            .is_some_and(|cause| cause.downcast_ref::<ContextError>().is_some())
    }
}

impl fmt::Display for LocalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {}, {}", self.status, self.kind.describe())?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LocalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// The outcome of parsing an error-class response, before it is attached to
/// its envelope.
#[derive(Debug)]
pub enum ResponseError {
    /// Structured server error.
    Server(ServerError),
    /// String-shaped server error.
    ServerString(StringError),
    /// Local failure while parsing.
    Local(LocalError),
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(e) => e.fmt(f),
            Self::ServerString(e) => e.fmt(f),
            Self::Local(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ResponseError {}
