//! Index mappings.

use crate::common::AcknowledgedResp;
use crate::endpoint::{header_field, request};
use crate::indices::Indices;
use crate::params::ExpandWildcards;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

params! {
    /// Parameters of [`MappingGetReq`].
    pub struct MappingGetParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `GET /<index>?/_mapping`
#[derive(Debug, Default)]
pub struct MappingGetReq {
    /// Indices to read; empty reads all.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: MappingGetParams,
}

impl Endpoint for MappingGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_mapping")
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`MappingGetReq`], keyed by index name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MappingGetResp {
    /// Mappings per index.
    pub indices: HashMap<String, IndexMapping>,
}

/// Mapping of one index.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexMapping {
    /// The mapping definition.
    pub mappings: Value,
}

params! {
    /// Parameters of [`MappingPutReq`].
    pub struct MappingPutParams {
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
        /// Only apply to the write index of an alias.
        write_index_only: Option<bool>,
    }
}

/// `PUT /<index>/_mapping`
#[derive(Debug, Default)]
pub struct MappingPutReq {
    /// Indices to update.
    pub indices: Vec<String>,
    /// New field definitions.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: MappingPutParams,
}

impl Endpoint for MappingPutReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_mapping")
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

impl Indices<'_> {
    /// Read field mappings.
    pub async fn get_mapping(
        &self,
        ctx: &Context,
        req: Option<MappingGetReq>,
    ) -> Result<Reply<MappingGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Add fields to a mapping.
    pub async fn put_mapping(
        &self,
        ctx: &Context,
        req: MappingPutReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_mapping() {
        let request = MappingPutReq {
            indices: vec!["movies".into()],
            body: Body::json(&json!({"properties": {"year": {"type": "integer"}}})).unwrap(),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/movies/_mapping");
        assert_eq!(
            request.headers()[http::header::CONTENT_TYPE],
            opal_core::JSON_CONTENT_TYPE
        );
    }

    #[test]
    fn test_get_mapping_response() {
        let resp: MappingGetResp =
            serde_json::from_str(r#"{"movies":{"mappings":{"properties":{"title":{"type":"text"}}}}}"#)
                .unwrap();
        assert_eq!(
            resp.indices["movies"].mappings["properties"]["title"]["type"],
            "text"
        );
    }
}
