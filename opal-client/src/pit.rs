//! Point-in-time search contexts.

use crate::common::ShardsInfo;
use crate::endpoint::{header_field, request};
use crate::params::ExpandWildcards;
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Point-in-time endpoints. Obtained from [`Client::point_in_time`].
#[derive(Debug, Clone, Copy)]
pub struct PointInTime<'a> {
    pub(crate) client: &'a Client,
}

params! {
    /// Parameters of [`PointInTimeCreateReq`].
    pub struct PointInTimeCreateParams {
        /// Create the context even if some shards are unavailable.
        allow_partial_pit_creation: Option<bool>,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// How long to keep the context open.
        keep_alive: Duration,
        /// Node or shard preference.
        preference: String,
        /// Routing value.
        routing: Vec<String>,
    }
}

/// `POST /<index>/_search/point_in_time`
#[derive(Debug, Default)]
pub struct PointInTimeCreateReq {
    /// Indices the context covers.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters. `keep_alive` is required by the server.
    pub params: PointInTimeCreateParams,
}

impl Endpoint for PointInTimeCreateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_search")
            .literal("point_in_time")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`PointInTimeCreateReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointInTimeCreateResp {
    /// Id to pass in later searches.
    pub pit_id: String,
    /// Shard outcome.
    #[serde(rename = "_shards")]
    pub shards: ShardsInfo,
    /// Milliseconds since the epoch.
    pub creation_time: i64,
}

params! {
    /// Parameters of [`PointInTimeGetReq`].
    pub struct PointInTimeGetParams {}
}

/// `GET /_search/point_in_time/_all`
#[derive(Debug, Default)]
pub struct PointInTimeGetReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: PointInTimeGetParams,
}

impl Endpoint for PointInTimeGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::GET,
            "/_search/point_in_time/_all",
            None,
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// Body of [`PointInTimeGetReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointInTimeGetResp {
    /// Live contexts.
    pub pits: Vec<PointInTimeInfo>,
}

/// One live point-in-time context.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointInTimeInfo {
    /// Point-in-time id.
    pub pit_id: String,
    /// Creation time, in epoch milliseconds.
    pub creation_time: i64,
    /// Keep-alive, in milliseconds.
    pub keep_alive: i64,
}

params! {
    /// Parameters of [`PointInTimeDeleteReq`].
    pub struct PointInTimeDeleteParams {}
}

/// `DELETE /_search/point_in_time`, or `/_search/point_in_time/_all`
/// when no id is given.
#[derive(Debug, Default)]
pub struct PointInTimeDeleteReq {
    /// Contexts to release; empty releases all.
    pub pit_ids: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: PointInTimeDeleteParams,
}

impl Endpoint for PointInTimeDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        if self.pit_ids.is_empty() {
            return request(
                Method::DELETE,
                "/_search/point_in_time/_all",
                None,
                &self.params,
                &self.header,
            );
        }
        let body = Body::json(&json!({ "pit_id": self.pit_ids }))?;
        request(
            Method::DELETE,
            "/_search/point_in_time",
            Some(body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// Body of [`PointInTimeDeleteReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointInTimeDeleteResp {
    /// Outcome per context.
    pub pits: Vec<PointInTimeDeleted>,
}

/// Outcome of releasing one context.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointInTimeDeleted {
    /// Point-in-time id.
    pub pit_id: String,
    /// Whether the context was released.
    pub successful: bool,
}

impl PointInTime<'_> {
    /// Open a point-in-time context.
    pub async fn create(
        &self,
        ctx: &Context,
        req: PointInTimeCreateReq,
    ) -> Result<Reply<PointInTimeCreateResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// List every live context.
    pub async fn get(
        &self,
        ctx: &Context,
        req: Option<PointInTimeGetReq>,
    ) -> Result<Reply<PointInTimeGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Release contexts.
    pub async fn delete(
        &self,
        ctx: &Context,
        req: Option<PointInTimeDeleteReq>,
    ) -> Result<Reply<PointInTimeDeleteResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_path() {
        let request = PointInTimeCreateReq {
            indices: vec!["movies".into(), "books".into()],
            params: PointInTimeCreateParams {
                keep_alive: Duration::from_secs(60),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.uri(),
            "/movies,books/_search/point_in_time?keep_alive=60000ms"
        );
    }

    #[test]
    fn test_delete_ids_travel_in_body() {
        let request = PointInTimeDeleteReq {
            pit_ids: vec!["o463QQ".into()],
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_search/point_in_time");
        assert_eq!(
            request.body().as_bytes().map(|b| &b[..]),
            Some(&br#"{"pit_id":["o463QQ"]}"#[..])
        );

        let request = PointInTimeDeleteReq::default().to_request().unwrap();
        assert_eq!(request.uri(), "/_search/point_in_time/_all");
        assert!(request.body().is_empty());
    }
}
