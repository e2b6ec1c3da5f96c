//! Cluster info and ping.

use crate::endpoint::{header_field, request};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, Reply, Response, Result};
use serde::Deserialize;

params! {
    /// Parameters of [`InfoReq`].
    pub struct InfoParams {}
}

/// `GET /`
#[derive(Debug, Default)]
pub struct InfoReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: InfoParams,
}

impl Endpoint for InfoReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(Method::GET, "/", None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`InfoReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InfoResp {
    /// Node name.
    pub name: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Cluster UUID.
    pub cluster_uuid: String,
    /// Build and version details.
    pub version: InfoVersion,
    /// Server tagline.
    pub tagline: String,
}

/// Version block of [`InfoResp`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfoVersion {
    /// Distribution name, e.g. `opensearch`.
    pub distribution: String,
    /// Version number.
    pub number: String,
    /// Build type.
    pub build_type: Option<String>,
    /// Build hash.
    pub build_hash: Option<String>,
    /// Build date.
    pub build_date: Option<String>,
    /// Whether this is a snapshot build.
    pub build_snapshot: Option<bool>,
    /// Lucene version.
    pub lucene_version: Option<String>,
    /// Oldest version this node can talk to.
    pub minimum_wire_compatibility_version: Option<String>,
    /// Oldest index version this node can read.
    pub minimum_index_compatibility_version: Option<String>,
}

params! {
    /// Parameters of [`PingReq`].
    pub struct PingParams {}
}

/// `HEAD /`
#[derive(Debug, Default)]
pub struct PingReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: PingParams,
}

impl Endpoint for PingReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(Method::HEAD, "/", None, &self.params, &self.header)
    }

    header_field!();
}

impl Client {
    /// Basic information about the cluster.
    pub async fn info(&self, ctx: &Context, req: Option<InfoReq>) -> Result<Reply<InfoResp>> {
        self.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Check that the server answers.
    pub async fn ping(&self, ctx: &Context, req: Option<PingReq>) -> Result<Response> {
        self.perform(ctx, req.unwrap_or_default()).await
    }
}
