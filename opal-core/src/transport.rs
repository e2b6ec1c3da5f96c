//! The transport capability.

use crate::body::Body;
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;

/// Performs one HTTP round-trip.
///
/// Connection pooling, retries, TLS and authentication all live behind this
/// trait. Implementations must tolerate concurrent calls. The call's
/// [`Context`](crate::Context) is available as a request extension.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the server's response.
    async fn perform(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn perform(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, TransportError> {
        (**self).perform(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn perform(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, TransportError> {
        (**self).perform(request).await
    }
}
