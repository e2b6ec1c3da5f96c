//! Index management: create, delete, get, exists, refresh, open, close.
//!
//! Aliases, mappings and settings live in their own modules and extend
//! [`Indices`] with further methods.

use crate::common::{AcknowledgedResp, ShardsAcknowledgedResp, ShardsInfo};
use crate::endpoint::{header_field, request};
use crate::params::ExpandWildcards;
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Response, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Index management endpoints. Obtained from [`Client::indices`].
#[derive(Debug, Clone, Copy)]
pub struct Indices<'a> {
    pub(crate) client: &'a Client,
}

params! {
    /// Parameters of [`IndicesCreateReq`].
    pub struct IndicesCreateParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
    }
}

/// `PUT /<index>`
#[derive(Debug, Default)]
pub struct IndicesCreateReq {
    /// Index to create.
    pub index: String,
    /// Settings, mappings and aliases.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesCreateParams,
}

impl Endpoint for IndicesCreateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new().part("index", &self.index).build()?;
        request(Method::PUT, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`IndicesCreateReq`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndicesCreateResp {
    /// Whether the index was created.
    pub acknowledged: bool,
    /// Whether the required shard copies started in time.
    pub shards_acknowledged: bool,
    /// Name of the created index.
    pub index: String,
}

params! {
    /// Parameters of [`IndicesDeleteReq`].
    pub struct IndicesDeleteParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `DELETE /<index>`
#[derive(Debug, Default)]
pub struct IndicesDeleteReq {
    /// Indices to delete.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesDeleteParams,
}

impl Endpoint for IndicesDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new().list("index", &self.indices).build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`IndicesGetReq`].
    pub struct IndicesGetParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Include default settings.
        include_defaults: Option<bool>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `GET /<index>`
#[derive(Debug, Default)]
pub struct IndicesGetReq {
    /// Indices to describe.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesGetParams,
}

impl Endpoint for IndicesGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new().list("index", &self.indices).build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`IndicesGetReq`], keyed by index name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct IndicesGetResp {
    /// Index definitions.
    pub indices: HashMap<String, IndicesGetDetails>,
}

/// One index definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicesGetDetails {
    /// Aliases pointing at the index.
    pub aliases: HashMap<String, Value>,
    /// Field mappings.
    pub mappings: Value,
    /// Index settings.
    pub settings: Value,
}

params! {
    /// Parameters of [`IndicesExistsReq`].
    pub struct IndicesExistsParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Include default settings.
        include_defaults: Option<bool>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `HEAD /<index>`
#[derive(Debug, Default)]
pub struct IndicesExistsReq {
    /// Indices to check.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesExistsParams,
}

impl Endpoint for IndicesExistsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new().list("index", &self.indices).build()?;
        request(Method::HEAD, &path, None, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`IndicesRefreshReq`].
    pub struct IndicesRefreshParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
    }
}

/// `POST /<index>?/_refresh`
#[derive(Debug, Default)]
pub struct IndicesRefreshReq {
    /// Indices to refresh; empty refreshes all.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesRefreshParams,
}

impl Endpoint for IndicesRefreshReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_refresh")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`IndicesRefreshReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndicesRefreshResp {
    /// Shard outcome.
    #[serde(rename = "_shards")]
    pub shards: ShardsInfo,
}

params! {
    /// Parameters of [`IndicesOpenReq`] and [`IndicesCloseReq`].
    pub struct IndicesOpenCloseParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /<index>/_open`
#[derive(Debug, Default)]
pub struct IndicesOpenReq {
    /// Indices to open.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesOpenCloseParams,
}

impl Endpoint for IndicesOpenReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_open")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// `POST /<index>/_close`
#[derive(Debug, Default)]
pub struct IndicesCloseReq {
    /// Indices to close.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndicesOpenCloseParams,
}

impl Endpoint for IndicesCloseReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_close")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`IndicesCloseReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndicesCloseResp {
    /// Whether the indices were closed.
    pub acknowledged: bool,
    /// Whether the required shard copies acknowledged in time.
    pub shards_acknowledged: bool,
    /// Per-index outcome.
    #[serde(default)]
    pub indices: HashMap<String, Value>,
}

impl Indices<'_> {
    /// Create an index.
    pub async fn create(
        &self,
        ctx: &Context,
        req: IndicesCreateReq,
    ) -> Result<Reply<IndicesCreateResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Delete indices.
    pub async fn delete(
        &self,
        ctx: &Context,
        req: IndicesDeleteReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Describe indices.
    pub async fn get(&self, ctx: &Context, req: IndicesGetReq) -> Result<Reply<IndicesGetResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Check whether indices exist: 200 if all do, 404 otherwise.
    pub async fn exists(&self, ctx: &Context, req: IndicesExistsReq) -> Result<Response> {
        self.client.exists(ctx, req).await
    }

    /// Make recent writes searchable.
    pub async fn refresh(
        &self,
        ctx: &Context,
        req: Option<IndicesRefreshReq>,
    ) -> Result<Reply<IndicesRefreshResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Open closed indices.
    pub async fn open(
        &self,
        ctx: &Context,
        req: IndicesOpenReq,
    ) -> Result<Reply<ShardsAcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Close indices.
    pub async fn close(
        &self,
        ctx: &Context,
        req: IndicesCloseReq,
    ) -> Result<Reply<IndicesCloseResp>> {
        self.client.perform_json(ctx, req).await
    }
}
