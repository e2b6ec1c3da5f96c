//! Single-document endpoints and multi-get.

use crate::common::ShardsInfo;
use crate::endpoint::{header_field, request};
use crate::params::{OpType, Refresh, VersionType};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{
    params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Response, Result,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Single-document endpoints. Obtained from [`Client::documents`].
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub(crate) client: &'a Client,
}

/// Result of a document write (create, index, update, delete).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentWriteResp {
    /// Index written to.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// New document version.
    #[serde(rename = "_version")]
    pub version: i64,
    /// `created`, `updated`, `deleted`, `noop` or `not_found`.
    pub result: String,
    /// Shard outcome.
    #[serde(rename = "_shards")]
    pub shards: ShardsInfo,
    /// Sequence number.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    /// Primary term.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
    /// Whether the write forced a refresh.
    #[serde(default)]
    pub forced_refresh: Option<bool>,
    /// Updated source, when an update asked for it.
    #[serde(default)]
    pub get: Option<Value>,
}

/// Body of [`DocumentCreateReq`].
pub type DocumentCreateResp = DocumentWriteResp;
/// Body of [`IndexReq`].
pub type IndexResp = DocumentWriteResp;
/// Body of [`DocumentUpdateReq`].
pub type DocumentUpdateResp = DocumentWriteResp;
/// Body of [`DocumentDeleteReq`].
pub type DocumentDeleteResp = DocumentWriteResp;

// =========================================================================
// Create
// =========================================================================

params! {
    /// Parameters of [`DocumentCreateReq`].
    pub struct DocumentCreateParams {
        /// Ingest pipeline to run.
        pipeline: String,
        /// Refresh affected shards.
        refresh: Option<Refresh>,
        /// Routing value.
        routing: String,
        /// How long to wait for a response.
        timeout: Duration,
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
    }
}

/// `PUT /<index>/_create/<id>`
#[derive(Debug, Default)]
pub struct DocumentCreateReq {
    /// Target index.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Document source.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentCreateParams,
}

impl Endpoint for DocumentCreateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_create")
            .part("id", &self.document_id)
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

// =========================================================================
// Index
// =========================================================================

params! {
    /// Parameters of [`IndexReq`].
    pub struct IndexParams {
        /// Only act if the document has this primary term.
        if_primary_term: Option<i64>,
        /// Only act if the document has this sequence number.
        if_seq_no: Option<i64>,
        /// Whether to index or only create.
        op_type: Option<OpType>,
        /// Ingest pipeline to run.
        pipeline: String,
        /// Refresh affected shards.
        refresh: Option<Refresh>,
        /// Require the target to be an alias.
        require_alias: Option<bool>,
        /// Routing value.
        routing: String,
        /// How long to wait for a response.
        timeout: Duration,
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
    }
}

/// `PUT /<index>/_doc/<id>`, or `POST /<index>/_doc` without an id.
#[derive(Debug, Default)]
pub struct IndexReq {
    /// Target index.
    pub index: String,
    /// Document id; empty lets the server assign one.
    pub document_id: String,
    /// Document source.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: IndexParams,
}

impl Endpoint for IndexReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_doc")
            .optional(&self.document_id)
            .build()?;
        let method = if self.document_id.is_empty() {
            Method::POST
        } else {
            Method::PUT
        };
        request(method, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

// =========================================================================
// Get, exists, source
// =========================================================================

params! {
    /// Parameters of [`DocumentGetReq`].
    pub struct DocumentGetParams {
        /// Node or shard preference.
        preference: String,
        /// Read in real time instead of from the last refresh.
        realtime: Option<bool>,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Routing value.
        routing: String,
        /// Whether to return `_source`.
        source: Option<bool> => "_source",
        /// Fields to drop from `_source`.
        source_excludes: Vec<String> => "_source_excludes",
        /// Fields to keep in `_source`.
        source_includes: Vec<String> => "_source_includes",
        /// Stored fields to return.
        stored_fields: Vec<String>,
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
    }
}

/// `GET /<index>/_doc/<id>`
#[derive(Debug, Default)]
pub struct DocumentGetReq {
    /// Index to read from.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentGetParams,
}

impl Endpoint for DocumentGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_doc")
            .part("id", &self.document_id)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`DocumentGetReq`] and one entry of [`MGetResp`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentGetResp {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document version.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// Sequence number.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    /// Primary term.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
    /// Whether the document exists.
    #[serde(default)]
    pub found: bool,
    /// Routing value.
    #[serde(rename = "_routing", default)]
    pub routing: Option<String>,
    /// Document source.
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
    /// Stored fields.
    #[serde(default)]
    pub fields: Option<Value>,
    /// Per-document failure inside a multi-get.
    #[serde(default)]
    pub error: Option<Value>,
}

impl DocumentGetResp {
    /// Decode the source into `T`.
    pub fn source_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.source.clone().map(serde_json::from_value).transpose()
    }
}

params! {
    /// Parameters of [`DocumentExistsReq`].
    pub struct DocumentExistsParams {
        /// Node or shard preference.
        preference: String,
        /// Read in real time instead of from the last refresh.
        realtime: Option<bool>,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Routing value.
        routing: String,
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
    }
}

/// `HEAD /<index>/_doc/<id>`
#[derive(Debug, Default)]
pub struct DocumentExistsReq {
    /// Index to check.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentExistsParams,
}

impl Endpoint for DocumentExistsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_doc")
            .part("id", &self.document_id)
            .build()?;
        request(Method::HEAD, &path, None, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`DocumentSourceReq`].
    pub struct DocumentSourceParams {
        /// Node or shard preference.
        preference: String,
        /// Read in real time instead of from the last refresh.
        realtime: Option<bool>,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Routing value.
        routing: String,
        /// Fields to drop from `_source`.
        source_excludes: Vec<String> => "_source_excludes",
        /// Fields to keep in `_source`.
        source_includes: Vec<String> => "_source_includes",
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
    }
}

/// `GET /<index>/_source/<id>`
#[derive(Debug, Default)]
pub struct DocumentSourceReq {
    /// Index to read from.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentSourceParams,
}

impl Endpoint for DocumentSourceReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_source")
            .part("id", &self.document_id)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`DocumentSourceReq`]: the bare document source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DocumentSourceResp {
    /// The source.
    pub source: Value,
}

// =========================================================================
// Update, delete
// =========================================================================

params! {
    /// Parameters of [`DocumentUpdateReq`].
    pub struct DocumentUpdateParams {
        /// Only act if the document has this primary term.
        if_primary_term: Option<i64>,
        /// Only act if the document has this sequence number.
        if_seq_no: Option<i64>,
        /// Script language.
        lang: String,
        /// Refresh affected shards.
        refresh: Option<Refresh>,
        /// Require the target to be an alias.
        require_alias: Option<bool>,
        /// Retries on a version conflict.
        retry_on_conflict: Option<i64>,
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

/// `POST /<index>/_update/<id>`
#[derive(Debug, Default)]
pub struct DocumentUpdateReq {
    /// Index holding the document.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Partial document or script.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentUpdateParams,
}

impl Endpoint for DocumentUpdateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_update")
            .part("id", &self.document_id)
            .build()?;
        request(Method::POST, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`DocumentDeleteReq`].
    pub struct DocumentDeleteParams {
        /// Only act if the document has this primary term.
        if_primary_term: Option<i64>,
        /// Only act if the document has this sequence number.
        if_seq_no: Option<i64>,
        /// Refresh affected shards.
        refresh: Option<Refresh>,
        /// Routing value.
        routing: String,
        /// How long to wait for a response.
        timeout: Duration,
        /// Expected document version.
        version: Option<i64>,
        /// Version type.
        version_type: Option<VersionType>,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
    }
}

/// `DELETE /<index>/_doc/<id>`
#[derive(Debug, Default)]
pub struct DocumentDeleteReq {
    /// Index holding the document.
    pub index: String,
    /// Document id.
    pub document_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: DocumentDeleteParams,
}

impl Endpoint for DocumentDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .part("index", &self.index)
            .literal("_doc")
            .part("id", &self.document_id)
            .build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

// =========================================================================
// Multi-get
// =========================================================================

params! {
    /// Parameters of [`MGetReq`].
    pub struct MGetParams {
        /// Node or shard preference.
        preference: String,
        /// Read in real time instead of from the last refresh.
        realtime: Option<bool>,
        /// Refresh affected shards.
        refresh: Option<bool>,
        /// Routing value.
        routing: String,
        /// Whether to return `_source`.
        source: Option<bool> => "_source",
        /// Fields to drop from `_source`.
        source_excludes: Vec<String> => "_source_excludes",
        /// Fields to keep in `_source`.
        source_includes: Vec<String> => "_source_includes",
        /// Stored fields to return.
        stored_fields: Vec<String>,
    }
}

/// `POST /<index>?/_mget`
#[derive(Debug, Default)]
pub struct MGetReq {
    /// Default index for entries that do not name one.
    pub index: String,
    /// `{"docs": [...]}` or `{"ids": [...]}`.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: MGetParams,
}

impl Endpoint for MGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional(&self.index)
            .literal("_mget")
            .build()?;
        request(Method::POST, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`MGetReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MGetResp {
    /// One entry per requested document, in request order.
    pub docs: Vec<DocumentGetResp>,
}

impl Client {
    /// Fetch several documents in one request.
    pub async fn mget(&self, ctx: &Context, req: MGetReq) -> Result<Reply<MGetResp>> {
        self.perform_json(ctx, req).await
    }
}

impl Document<'_> {
    /// Create a document, failing if the id is taken.
    pub async fn create(
        &self,
        ctx: &Context,
        req: DocumentCreateReq,
    ) -> Result<Reply<DocumentCreateResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Create or replace a document.
    pub async fn index(&self, ctx: &Context, req: IndexReq) -> Result<Reply<IndexResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Fetch a document.
    pub async fn get(&self, ctx: &Context, req: DocumentGetReq) -> Result<Reply<DocumentGetResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Check whether a document exists: 200 if it does, 404 if not.
    pub async fn exists(&self, ctx: &Context, req: DocumentExistsReq) -> Result<Response> {
        self.client.exists(ctx, req).await
    }

    /// Fetch only a document's source.
    pub async fn source(
        &self,
        ctx: &Context,
        req: DocumentSourceReq,
    ) -> Result<Reply<DocumentSourceResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Partially update a document.
    pub async fn update(
        &self,
        ctx: &Context,
        req: DocumentUpdateReq,
    ) -> Result<Reply<DocumentUpdateResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Delete a document.
    pub async fn delete(
        &self,
        ctx: &Context,
        req: DocumentDeleteReq,
    ) -> Result<Reply<DocumentDeleteResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_auto_and_explicit_id() {
        let request = IndexReq {
            index: "movies".into(),
            body: Body::from("{}"),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "/movies/_doc");

        let request = IndexReq {
            index: "movies".into(),
            document_id: "tt0078748".into(),
            body: Body::from("{}"),
            params: IndexParams {
                op_type: Some(OpType::Create),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/movies/_doc/tt0078748?op_type=create");
    }

    #[test]
    fn test_ids_are_escaped() {
        let request = DocumentGetReq {
            index: "movies".into(),
            document_id: "a/b c".into(),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri().path(), "/movies/_doc/a%2Fb%20c");
    }

    #[test]
    fn test_missing_id() {
        let err = DocumentDeleteReq {
            index: "movies".into(),
            ..Default::default()
        }
        .to_request()
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("id")));
    }

    #[test]
    fn test_dot_id_does_not_escape_the_document() {
        for id in [".", ".."] {
            let err = DocumentDeleteReq {
                index: "movies".into(),
                document_id: id.into(),
                ..Default::default()
            }
            .to_request()
            .unwrap_err();
            assert!(matches!(err, BuildError::InvalidPart("id")));
        }
    }

    #[test]
    fn test_mget_path() {
        let request = MGetReq {
            body: Body::from(r#"{"docs":[{"_index":"movies","_id":"1"}]}"#),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_mget");
    }
}
