//! Delete-by-query, update-by-query and reindex.

use crate::common::ByQueryResp;
use crate::endpoint::{header_field, request};
use crate::params::{Conflicts, DefaultOperator, ExpandWildcards, SearchType};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde_json::Value;
use std::time::Duration;

params! {
    /// Parameters of [`DeleteByQueryReq`].
    pub struct DeleteByQueryParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Analyze wildcard and prefix queries.
        analyze_wildcard: Option<bool>,
        /// Analyzer for the query string.
        analyzer: String,
        /// What to do on version conflicts.
        conflicts: Option<Conflicts>,
        /// Default operator for the query string.
        default_operator: Option<DefaultOperator>,
        /// Default field for the query string.
        df: String,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Offset of the first hit.
        from: Option<i64>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Ignore format-based query failures.
        lenient: Option<bool>,
        /// Maximum number of documents to process.
        max_docs: Option<i64>,
        /// Node or shard preference.
        preference: String,
        /// Query in Lucene query string syntax.
        q: String,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Use the shard request cache.
        request_cache: Option<bool>,
        /// Throttle in sub-requests per second.
        requests_per_second: Option<f64>,
        /// Routing value.
        routing: Vec<String>,
        /// How long to keep the scroll context.
        scroll: Duration,
        /// Batch size of the underlying scroll.
        scroll_size: Option<i64>,
        /// Timeout of each search request.
        search_timeout: Duration,
        /// Search type.
        search_type: Option<SearchType>,
        /// Number of slices, or `auto`.
        slices: Option<Value>,
        /// Sort order as `field:direction` pairs.
        sort: Vec<String>,
        /// Statistics groups to tag the request with.
        stats: Vec<String>,
        /// Maximum documents to collect per shard.
        terminate_after: Option<i64>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Return the version of each hit.
        version: Option<bool>,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /<index>/_delete_by_query`
#[derive(Debug, Default)]
pub struct DeleteByQueryReq {
    /// Indices to delete from.
    pub indices: Vec<String>,
    /// Query selecting the documents.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DeleteByQueryParams,
}

impl Endpoint for DeleteByQueryReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_delete_by_query")
            .build()?;
        request(Method::POST, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`UpdateByQueryReq`].
    pub struct UpdateByQueryParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Analyze wildcard and prefix queries.
        analyze_wildcard: Option<bool>,
        /// Analyzer for the query string.
        analyzer: String,
        /// What to do on version conflicts.
        conflicts: Option<Conflicts>,
        /// Default operator for the query string.
        default_operator: Option<DefaultOperator>,
        /// Default field for the query string.
        df: String,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Offset of the first hit.
        from: Option<i64>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Ignore format-based query failures.
        lenient: Option<bool>,
        /// Maximum number of documents to process.
        max_docs: Option<i64>,
        /// Ingest pipeline to run.
        pipeline: String,
        /// Node or shard preference.
        preference: String,
        /// Query in Lucene query string syntax.
        q: String,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Use the shard request cache.
        request_cache: Option<bool>,
        /// Throttle in sub-requests per second.
        requests_per_second: Option<f64>,
        /// Routing value.
        routing: Vec<String>,
        /// How long to keep the scroll context.
        scroll: Duration,
        /// Batch size of the underlying scroll.
        scroll_size: Option<i64>,
        /// Timeout of each search request.
        search_timeout: Duration,
        /// Search type.
        search_type: Option<SearchType>,
        /// Number of slices, or `auto`.
        slices: Option<Value>,
        /// Sort order as `field:direction` pairs.
        sort: Vec<String>,
        /// Statistics groups to tag the request with.
        stats: Vec<String>,
        /// Maximum documents to collect per shard.
        terminate_after: Option<i64>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Return the version of each hit.
        version: Option<bool>,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /<index>/_update_by_query`
#[derive(Debug, Default)]
pub struct UpdateByQueryReq {
    /// Indices to update.
    pub indices: Vec<String>,
    /// Query and script; without one every document is touched.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: UpdateByQueryParams,
}

impl Endpoint for UpdateByQueryReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_update_by_query")
            .build()?;
        request(Method::POST, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`ReindexReq`].
    pub struct ReindexParams {
        /// Maximum number of documents to process.
        max_docs: Option<i64>,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Throttle in sub-requests per second.
        requests_per_second: Option<f64>,
        /// Require the target to be an alias.
        require_alias: Option<bool>,
        /// How long to keep the scroll context.
        scroll: Duration,
        /// Number of slices, or `auto`.
        slices: Option<Value>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /_reindex`
#[derive(Debug, Default)]
pub struct ReindexReq {
    /// Source and destination definition.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ReindexParams,
}

impl Endpoint for ReindexReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::POST,
            "/_reindex",
            Some(self.body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

impl Client {
    /// Delete every document matching a query.
    pub async fn delete_by_query(
        &self,
        ctx: &Context,
        req: DeleteByQueryReq,
    ) -> Result<Reply<ByQueryResp>> {
        self.perform_json(ctx, req).await
    }

    /// Update every document matching a query.
    pub async fn update_by_query(
        &self,
        ctx: &Context,
        req: UpdateByQueryReq,
    ) -> Result<Reply<ByQueryResp>> {
        self.perform_json(ctx, req).await
    }

    /// Copy documents from one index to another.
    pub async fn reindex(&self, ctx: &Context, req: ReindexReq) -> Result<Reply<ByQueryResp>> {
        self.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_by_query_requires_index() {
        let err = DeleteByQueryReq::default().to_request().unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("index")));
    }

    #[test]
    fn test_slices_auto() {
        let request = UpdateByQueryReq {
            indices: vec!["logs-*".into()],
            params: UpdateByQueryParams {
                slices: Some(json!("auto")),
                conflicts: Some(Conflicts::Proceed),
                wait_for_completion: Some(false),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(
            request.uri(),
            "/logs-*/_update_by_query?conflicts=proceed&slices=auto&wait_for_completion=false"
        );
    }
}
