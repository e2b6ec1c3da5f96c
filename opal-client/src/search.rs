//! Search, count and scrolling.

use crate::common::ShardsInfo;
use crate::endpoint::{header_field, request};
use crate::params::{DefaultOperator, ExpandWildcards, SearchType};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

params! {
    /// Parameters of [`SearchReq`].
    pub struct SearchParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Return partial results when some shards fail.
        allow_partial_search_results: Option<bool>,
        /// Analyze wildcard and prefix queries.
        analyze_wildcard: Option<bool>,
        /// Analyzer for the query string.
        analyzer: String,
        /// Shard results reduced at once on the coordinating node.
        batched_reduce_size: Option<i64>,
        /// Minimize round trips to remote clusters.
        ccs_minimize_roundtrips: Option<bool>,
        /// Default operator for the query string.
        default_operator: Option<DefaultOperator>,
        /// Default field for the query string.
        df: String,
        /// Fields to return from doc values.
        docvalue_fields: Vec<String>,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Explain how each hit was scored.
        explain: Option<bool>,
        /// Offset of the first hit.
        from: Option<i64>,
        /// Skip frozen indices.
        ignore_throttled: Option<bool>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Ignore format-based query failures.
        lenient: Option<bool>,
        /// Concurrent shard requests per node.
        max_concurrent_shard_requests: Option<i64>,
        /// Shard count above which a pre-filter round runs.
        pre_filter_shard_size: Option<i64>,
        /// Node or shard preference.
        preference: String,
        /// Query in Lucene query string syntax.
        q: String,
        /// Use the shard request cache.
        request_cache: Option<bool>,
        /// Return `hits.total` as a number.
        rest_total_hits_as_int: Option<bool>,
        /// Routing value.
        routing: Vec<String>,
        /// How long to keep the scroll context.
        scroll: Duration,
        /// Search type.
        search_type: Option<SearchType>,
        /// Return sequence number and primary term of each hit.
        seq_no_primary_term: Option<bool>,
        /// Number of hits to return.
        size: Option<i64>,
        /// Sort order as `field:direction` pairs.
        sort: Vec<String>,
        /// Whether to return `_source`.
        source: Option<bool> => "_source",
        /// Fields to drop from `_source`.
        source_excludes: Vec<String> => "_source_excludes",
        /// Fields to keep in `_source`.
        source_includes: Vec<String> => "_source_includes",
        /// Statistics groups to tag the request with.
        stats: Vec<String>,
        /// Stored fields to return.
        stored_fields: Vec<String>,
        /// Field to base suggestions on.
        suggest_field: String,
        /// Suggestion mode.
        suggest_mode: String,
        /// Number of suggestions to return.
        suggest_size: Option<i64>,
        /// Text to suggest for.
        suggest_text: String,
        /// Maximum documents to collect per shard.
        terminate_after: Option<i64>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Compute scores even when sorting.
        track_scores: Option<bool>,
        /// Whether or up to where to count total hits.
        track_total_hits: Option<Value>,
        /// Prefix aggregation names with their type.
        typed_keys: Option<bool>,
        /// Return the version of each hit.
        version: Option<bool>,
    }
}

/// `POST /<index>?/_search`, or `GET` without a body.
#[derive(Debug, Default)]
pub struct SearchReq {
    /// Indices to search; empty searches all.
    pub indices: Vec<String>,
    /// Search body (query, aggregations, sort, ...).
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SearchParams,
}

impl Endpoint for SearchReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_search")
            .build()?;
        let method = if self.body.is_some() {
            Method::POST
        } else {
            Method::GET
        };
        request(method, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SearchReq`] and the scroll endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResp {
    /// Milliseconds taken.
    pub took: u64,
    /// Whether the search timed out.
    pub timed_out: bool,
    /// Shard outcome.
    #[serde(rename = "_shards")]
    pub shards: ShardsInfo,
    /// Matching documents.
    pub hits: SearchHits,
    /// Aggregation results.
    #[serde(default)]
    pub aggregations: Option<Value>,
    /// Suggester results.
    #[serde(default)]
    pub suggest: Option<Value>,
    /// Scroll id, when scrolling.
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    /// Point-in-time id, when searching one.
    #[serde(default)]
    pub pit_id: Option<String>,
}

/// The `hits` block of a search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchHits {
    /// Total matches. Absent with `track_total_hits=false`.
    #[serde(default)]
    pub total: Option<HitsTotal>,
    /// Best score.
    #[serde(default)]
    pub max_score: Option<f64>,
    /// The returned page of hits.
    pub hits: Vec<SearchHit>,
}

/// Total hit count and whether it is exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HitsTotal {
    /// Count.
    pub value: u64,
    /// `eq` when exact, `gte` when a lower bound.
    pub relation: String,
}

/// One search hit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchHit {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Document source.
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
    /// Document version, with `version=true`.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// Sequence number, with `seq_no_primary_term=true`.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    /// Primary term, with `seq_no_primary_term=true`.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
    /// Routing value.
    #[serde(rename = "_routing", default)]
    pub routing: Option<String>,
    /// Requested fields.
    #[serde(default)]
    pub fields: Option<Value>,
    /// Sort values.
    #[serde(default)]
    pub sort: Vec<Value>,
    /// Highlighted fragments.
    #[serde(default)]
    pub highlight: Option<Value>,
    /// Inner hits.
    #[serde(default)]
    pub inner_hits: Option<Value>,
    /// Named queries that matched.
    #[serde(default)]
    pub matched_queries: Vec<String>,
}

impl SearchHit {
    /// Decode the source into `T`.
    pub fn source_as<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.source.clone().map(serde_json::from_value).transpose()
    }
}

params! {
    /// Parameters of [`CountReq`].
    pub struct CountParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Analyze wildcard and prefix queries.
        analyze_wildcard: Option<bool>,
        /// Analyzer for the query string.
        analyzer: String,
        /// Default operator for the query string.
        default_operator: Option<DefaultOperator>,
        /// Default field for the query string.
        df: String,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Skip frozen indices.
        ignore_throttled: Option<bool>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Ignore format-based query failures.
        lenient: Option<bool>,
        /// Minimum score for a document to count.
        min_score: Option<f64>,
        /// Node or shard preference.
        preference: String,
        /// Query in Lucene query string syntax.
        q: String,
        /// Routing value.
        routing: Vec<String>,
        /// Maximum documents to collect per shard.
        terminate_after: Option<i64>,
    }
}

/// `POST /<index>?/_count`, or `GET` without a body.
#[derive(Debug, Default)]
pub struct CountReq {
    /// Indices to count in; empty counts all.
    pub indices: Vec<String>,
    /// Query body.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: CountParams,
}

impl Endpoint for CountReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_count")
            .build()?;
        let method = if self.body.is_some() {
            Method::POST
        } else {
            Method::GET
        };
        request(method, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`CountReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountResp {
    /// Matching documents.
    pub count: u64,
    /// Shard outcome.
    #[serde(rename = "_shards")]
    pub shards: ShardsInfo,
}

params! {
    /// Parameters of [`ScrollGetReq`].
    pub struct ScrollGetParams {
        /// How long to keep the scroll context.
        scroll: Duration,
        /// Return `hits.total` as a number.
        rest_total_hits_as_int: Option<bool>,
    }
}

/// `POST /_search/scroll`
///
/// The scroll id travels in the body so long ids never hit URL limits.
#[derive(Debug, Default)]
pub struct ScrollGetReq {
    /// Id returned by the previous page.
    pub scroll_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ScrollGetParams,
}

impl Endpoint for ScrollGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        if self.scroll_id.is_empty() {
            return Err(BuildError::MissingPart("scroll_id"));
        }
        let body = Body::json(&json!({ "scroll_id": self.scroll_id }))?;
        request(
            Method::POST,
            "/_search/scroll",
            Some(body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

params! {
    /// Parameters of [`ScrollDeleteReq`].
    pub struct ScrollDeleteParams {}
}

/// `DELETE /_search/scroll`, or `/_search/scroll/_all` when no ids are given.
#[derive(Debug, Default)]
pub struct ScrollDeleteReq {
    /// Scroll ids to clear; empty clears all.
    pub scroll_ids: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ScrollDeleteParams,
}

impl Endpoint for ScrollDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        if self.scroll_ids.is_empty() {
            return request(
                Method::DELETE,
                "/_search/scroll/_all",
                None,
                &self.params,
                &self.header,
            );
        }
        let body = Body::json(&json!({ "scroll_id": self.scroll_ids }))?;
        request(
            Method::DELETE,
            "/_search/scroll",
            Some(body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// Body of [`ScrollDeleteReq`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScrollDeleteResp {
    /// Whether the scrolls were cleared.
    pub succeeded: bool,
    /// Search contexts freed.
    pub num_freed: u64,
}

impl Client {
    /// Search documents.
    pub async fn search(&self, ctx: &Context, req: Option<SearchReq>) -> Result<Reply<SearchResp>> {
        self.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Count matching documents.
    pub async fn count(&self, ctx: &Context, req: Option<CountReq>) -> Result<Reply<CountResp>> {
        self.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Fetch the next page of a scroll.
    pub async fn scroll(&self, ctx: &Context, req: ScrollGetReq) -> Result<Reply<SearchResp>> {
        self.perform_json(ctx, req).await
    }

    /// Clear scroll contexts.
    pub async fn clear_scroll(
        &self,
        ctx: &Context,
        req: Option<ScrollDeleteReq>,
    ) -> Result<Reply<ScrollDeleteResp>> {
        self.perform_json(ctx, req.unwrap_or_default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::Params;

    #[test]
    fn test_search_path_and_method() {
        let req = SearchReq {
            indices: vec!["movies".into(), "books".into()],
            ..Default::default()
        };
        let request = req.to_request().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri(), "/movies,books/_search");

        let req = SearchReq {
            body: Some(Body::from(r#"{"query":{"match_all":{}}}"#)),
            ..Default::default()
        };
        let request = req.to_request().unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "/_search");
        assert_eq!(request.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_track_total_hits_accepts_bool_or_count() {
        let params = SearchParams {
            track_total_hits: Some(json!(10_000)),
            ..Default::default()
        };
        assert_eq!(params.to_query().get("track_total_hits"), Some("10000"));

        let params = SearchParams {
            track_total_hits: Some(json!(true)),
            ..Default::default()
        };
        assert_eq!(params.to_query().get("track_total_hits"), Some("true"));
    }

    #[test]
    fn test_scroll_requests() {
        let request = ScrollGetReq {
            scroll_id: "abc".into(),
            params: ScrollGetParams {
                scroll: Duration::from_secs(60),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_search/scroll?scroll=60000ms");
        assert_eq!(
            &request.body().as_bytes().unwrap()[..],
            br#"{"scroll_id":"abc"}"#
        );

        let err = ScrollGetReq::default().to_request().unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("scroll_id")));

        let request = ScrollDeleteReq::default().to_request().unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.uri(), "/_search/scroll/_all");
    }

    #[test]
    fn test_search_response_decodes() {
        let resp: SearchResp = serde_json::from_str(
            r#"{"took":5,"timed_out":false,"_shards":{"total":1,"successful":1,"skipped":0,"failed":0},
                "hits":{"total":{"value":1,"relation":"eq"},"max_score":1.0,
                "hits":[{"_index":"movies","_id":"1","_score":1.0,"_source":{"title":"Alien"}}]}}"#,
        )
        .unwrap();
        assert_eq!(resp.hits.total.as_ref().unwrap().value, 1);
        let hit = &resp.hits.hits[0];
        assert_eq!(hit.id, "1");

        #[derive(Deserialize)]
        struct Movie {
            title: String,
        }
        let movie: Movie = hit.source_as().unwrap().unwrap();
        assert_eq!(movie.title, "Alien");
    }
}
