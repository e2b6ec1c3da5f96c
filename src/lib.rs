// Opal - An async, strongly-typed client for OpenSearch-compatible servers
//
// This library bundles the dispatch pipeline, the endpoint catalogue and the
// default reqwest transport behind one dependency.

// Re-export the client façade and endpoint families
pub use opal_client::*;

// Re-export the pipeline
pub use opal_core::{
    Body, BuildError, Context, ContextError, Dispatcher, Endpoint, Error, LocalError,
    LocalErrorKind, Reply, Response, Result, ServerError, StringError, Transport, TransportError,
};

// Re-export the crates themselves
pub use opal_client;
pub use opal_core;

#[cfg(feature = "reqwest")]
pub use opal_transport;

#[cfg(feature = "reqwest")]
pub use opal_transport::{BackoffStrategy, ReqwestTransport, RetryConfig, TransportConfig};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Body, Client, ClientConfig, Context, Endpoint, Error, Reply, Response, Result, Transport,
    };

    pub use opal_core::params::{Param, ParamValue, Params};

    #[cfg(feature = "reqwest")]
    pub use crate::{ReqwestTransport, RetryConfig, TransportConfig};
}
