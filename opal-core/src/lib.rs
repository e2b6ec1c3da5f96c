//! # opal-core
//!
//! The request/response dispatch pipeline behind the Opal search client.
//!
//! Every API call follows the same path:
//!
//! 1. an [`Endpoint`] descriptor builds an `http::Request` from its path
//!    parts, query [`Params`], headers and optional [`Body`];
//! 2. the [`Dispatcher`] attaches the call's [`Context`], applies default
//!    headers and hands the request to a [`Transport`];
//! 3. the raw answer is wrapped in a [`Response`] envelope;
//! 4. error-class responses (400-599) are parsed into a server or local
//!    [`Error`]; success bodies are decoded into the caller's type and
//!    returned as a [`Reply`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use opal_core::{Context, Dispatcher};
//!
//! let dispatcher = Dispatcher::new(transport);
//! let reply: Reply<serde_json::Value> = dispatcher
//!     .perform_json(&Context::background(), request)
//!     .await?;
//! println!("{} took {}", reply.response.status(), reply["took"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod body;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod params;
pub mod parse;
pub mod request;
pub mod response;
pub mod transport;

pub use body::{Body, BodyStream, BoxError};
pub use context::{Context, ContextError};
pub use dispatch::Dispatcher;
pub use endpoint::Endpoint;
pub use error::{
    BuildError, CausedBy, Error, LocalError, LocalErrorKind, ResponseError, Result, RootCause,
    ServerError, StringError, TransportError,
};
pub use params::{Param, ParamValue, Params, Query};
pub use parse::parse_error;
pub use request::{build_request, escape_segment, PathBuilder, JSON_CONTENT_TYPE};
pub use response::{Reply, Response, OPAQUE_ID};
pub use transport::Transport;

// Re-exported for descriptor definitions.
pub use http;
