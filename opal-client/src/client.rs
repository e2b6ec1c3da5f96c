//! The client façade.

use crate::{
    cluster::Cluster, document::Document, indices::Indices, pit::PointInTime, snapshot::Snapshot,
    tasks::Tasks, templates::Templates, tiers::Tiers,
};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use opal_core::{
    BuildError, Context, Dispatcher, Endpoint, Error, Reply, Response, Result, Transport,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Settings shared by every call a [`Client`] makes.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Headers sent with every request, beneath each descriptor's own.
    pub default_headers: HeaderMap,
}

impl ClientConfig {
    /// Add a default header.
    pub fn with_header(mut self, name: &str, value: &str) -> std::result::Result<Self, BuildError> {
        self.default_headers
            .append(HeaderName::try_from(name)?, HeaderValue::try_from(value)?);
        Ok(self)
    }
}

/// Client for an OpenSearch-compatible server.
///
/// Cheap to clone; clones share the transport. Endpoint families are
/// reached through sub-clients such as [`Client::indices`].
#[derive(Clone, Debug)]
pub struct Client {
    dispatcher: Dispatcher,
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client over `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(ClientConfig::default(), transport)
    }

    /// Create a client with shared settings.
    pub fn with_config(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let dispatcher =
            Dispatcher::new(transport).with_default_headers(config.default_headers.clone());
        Self {
            dispatcher,
            config: Arc::new(config),
        }
    }

    /// Create a client for `url` over the default reqwest transport.
    #[cfg(feature = "reqwest")]
    pub fn from_url(
        url: impl Into<String>,
    ) -> std::result::Result<Self, opal_core::TransportError> {
        Ok(Self::new(opal_transport::ReqwestTransport::from_url(url)?))
    }

    /// Create a client from a transport configuration.
    #[cfg(feature = "reqwest")]
    pub fn from_transport_config(
        config: opal_transport::TransportConfig,
    ) -> std::result::Result<Self, opal_core::TransportError> {
        Ok(Self::new(opal_transport::ReqwestTransport::new(config)?))
    }

    /// The shared settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch any descriptor without decoding the body.
    pub async fn perform<E: Endpoint>(&self, ctx: &Context, req: E) -> Result<Response> {
        self.dispatcher.perform(ctx, req).await
    }

    /// Dispatch any descriptor and decode the body into `T`.
    pub async fn perform_json<E, T>(&self, ctx: &Context, req: E) -> Result<Reply<T>>
    where
        E: Endpoint,
        T: DeserializeOwned,
    {
        self.dispatcher.perform_json(ctx, req).await
    }

    /// Dispatch a `HEAD` descriptor.
    ///
    /// 200 means the resource exists and 404 that it does not; any other
    /// status is an error.
    pub(crate) async fn exists<E: Endpoint>(&self, ctx: &Context, req: E) -> Result<Response> {
        match self.dispatcher.perform(ctx, req).await {
            Ok(response) if response.status_code() == StatusCode::OK => Ok(response),
            Ok(response) => Err(Error::Status {
                response: Box::new(response),
            }),
            Err(Error::Status { response }) if response.status_code() == StatusCode::NOT_FOUND => {
                debug!("Resource does not exist");
                Ok(*response)
            }
            other => other,
        }
    }

    // =========================================================================
    // Sub-clients
    // =========================================================================

    /// Index management endpoints.
    pub fn indices(&self) -> Indices<'_> {
        Indices { client: self }
    }

    /// Single-document endpoints.
    pub fn documents(&self) -> Document<'_> {
        Document { client: self }
    }

    /// Cluster endpoints.
    pub fn cluster(&self) -> Cluster<'_> {
        Cluster { client: self }
    }

    /// Snapshot and repository endpoints.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot { client: self }
    }

    /// Task management endpoints.
    pub fn tasks(&self) -> Tasks<'_> {
        Tasks { client: self }
    }

    /// Index template endpoints.
    pub fn templates(&self) -> Templates<'_> {
        Templates { client: self }
    }

    /// Point-in-time endpoints.
    pub fn point_in_time(&self) -> PointInTime<'_> {
        PointInTime { client: self }
    }

    /// Storage tier migration endpoints.
    pub fn tiers(&self) -> Tiers<'_> {
        Tiers { client: self }
    }
}
