//! # Opal Transport
//!
//! The default [`Transport`](opal_core::Transport) for the Opal search
//! client, built on a pooled `reqwest` client.
//!
//! ## Features
//!
//! - **Base URL resolution**: origin-form request paths are joined onto the
//!   configured server URL, keeping any proxy path prefix
//! - **Retry with Backoff**: retry on gateway statuses and connection errors
//!   (exponential, linear, constant); streaming bodies are sent once
//! - **Basic Auth**: applied unless the request carries `Authorization`
//! - **Default Headers**: applied beneath each request's own headers
//! - **Compression**: gzip/brotli response decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opal_transport::{ReqwestTransport, RetryConfig, TransportConfig};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), opal_core::TransportError> {
//! let config = TransportConfig::builder()
//!     .base_url("https://search.internal:9200")
//!     .basic_auth("admin", "admin")
//!     .retry(RetryConfig::exponential(3, Duration::from_millis(100)))
//!     .build();
//!
//! let transport = ReqwestTransport::new(config)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod retry;
mod transport;

pub use config::{TransportConfig, TransportConfigBuilder, DEFAULT_URL};
pub use retry::{BackoffStrategy, RetryConfig};
pub use transport::ReqwestTransport;
