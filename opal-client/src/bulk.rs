//! Bulk indexing.
//!
//! The body is passed through untouched: callers supply the
//! newline-delimited action and source lines themselves.

use crate::common::ShardsInfo;
use crate::endpoint::{header_field, request};
use crate::params::Refresh;
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

params! {
    /// Parameters of [`BulkReq`].
    pub struct BulkParams {
        /// Ingest pipeline to run.
        pipeline: String,
        /// Refresh affected shards.
        refresh: Option<Refresh>,
        /// Require the target to be an alias.
        require_alias: Option<bool>,
        /// Routing value.
        routing: String,
        /// Whether to return `_source`.
        source: Option<bool> => "_source",
        /// Fields to drop from `_source`.
        source_excludes: Vec<String> => "_source_excludes",
        /// Fields to keep in `_source`.
        source_includes: Vec<String> => "_source_includes",
        /// How long to wait for a response.
        timeout: Duration,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
    }
}

/// `POST /<index>?/_bulk`
#[derive(Debug, Default)]
pub struct BulkReq {
    /// Default index for actions that do not name one.
    pub index: String,
    /// Newline-delimited actions.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: BulkParams,
}

impl Endpoint for BulkReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional(&self.index)
            .literal("_bulk")
            .build()?;
        request(Method::POST, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`BulkReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BulkResp {
    /// Milliseconds taken.
    pub took: u64,
    /// Whether any action failed.
    pub errors: bool,
    /// One entry per action, keyed by action name (`index`, `create`, ...).
    pub items: Vec<HashMap<String, BulkRespItem>>,
}

impl BulkResp {
    /// Items whose action failed.
    pub fn failed_items(&self) -> impl Iterator<Item = (&str, &BulkRespItem)> {
        self.items
            .iter()
            .flat_map(|item| item.iter())
            .filter(|(_, item)| item.error.is_some())
            .map(|(action, item)| (action.as_str(), item))
    }
}

/// Outcome of one bulk action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BulkRespItem {
    /// Target index.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// New document version.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// `created`, `updated`, `deleted`, `noop` or `not_found`.
    #[serde(default)]
    pub result: Option<String>,
    /// Shard outcome.
    #[serde(rename = "_shards", default)]
    pub shards: Option<ShardsInfo>,
    /// Sequence number.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    /// Primary term.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
    /// HTTP status of the action.
    pub status: u16,
    /// Failure details.
    #[serde(default)]
    pub error: Option<Value>,
}

impl Client {
    /// Perform many index, create, update and delete actions in one request.
    pub async fn bulk(&self, ctx: &Context, req: BulkReq) -> Result<Reply<BulkResp>> {
        self.perform_json(ctx, req).await
    }
}
