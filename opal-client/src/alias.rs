//! Index aliases.

use crate::common::AcknowledgedResp;
use crate::endpoint::{header_field, request};
use crate::indices::Indices;
use crate::params::ExpandWildcards;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Response, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

params! {
    /// Parameters of [`AliasPutReq`].
    pub struct AliasPutParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `PUT /<index>/_alias/<name>`
#[derive(Debug, Default)]
pub struct AliasPutReq {
    /// Indices the alias points at.
    pub indices: Vec<String>,
    /// Alias name.
    pub alias: String,
    /// Filter and routing for the alias.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: AliasPutParams,
}

impl Endpoint for AliasPutReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_alias")
            .part("alias", &self.alias)
            .build()?;
        request(Method::PUT, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`AliasGetReq`] and [`AliasExistsReq`].
    pub struct AliasGetParams {
        /// Whether a wildcard that matches no index is an error.
        allow_no_indices: Option<bool>,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `GET /<index>?/_alias/<name>?`
#[derive(Debug, Default)]
pub struct AliasGetReq {
    /// Indices to look in; empty looks everywhere.
    pub indices: Vec<String>,
    /// Aliases to return; empty returns all.
    pub aliases: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: AliasGetParams,
}

impl Endpoint for AliasGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_alias")
            .optional_list(&self.aliases)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`AliasGetReq`], keyed by index name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AliasGetResp {
    /// Aliases per index.
    pub indices: HashMap<String, IndexAliases>,
}

/// Aliases of one index.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexAliases {
    /// Alias definitions keyed by alias name.
    pub aliases: HashMap<String, Value>,
}

params! {
    /// Parameters of [`AliasDeleteReq`].
    pub struct AliasDeleteParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `DELETE /<index>/_alias/<name>`
#[derive(Debug, Default)]
pub struct AliasDeleteReq {
    /// Indices to detach from.
    pub indices: Vec<String>,
    /// Aliases to remove.
    pub aliases: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: AliasDeleteParams,
}

impl Endpoint for AliasDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .list("index", &self.indices)
            .literal("_alias")
            .list("alias", &self.aliases)
            .build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// `HEAD /<index>?/_alias/<name>`
#[derive(Debug, Default)]
pub struct AliasExistsReq {
    /// Indices to look in; empty looks everywhere.
    pub indices: Vec<String>,
    /// Aliases to check.
    pub aliases: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: AliasGetParams,
}

impl Endpoint for AliasExistsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_alias")
            .list("alias", &self.aliases)
            .build()?;
        request(Method::HEAD, &path, None, &self.params, &self.header)
    }

    header_field!();
}

impl Indices<'_> {
    /// Point an alias at indices.
    pub async fn put_alias(
        &self,
        ctx: &Context,
        req: AliasPutReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// List aliases.
    pub async fn get_alias(
        &self,
        ctx: &Context,
        req: Option<AliasGetReq>,
    ) -> Result<Reply<AliasGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Remove aliases.
    pub async fn delete_alias(
        &self,
        ctx: &Context,
        req: AliasDeleteReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Check whether aliases exist: 200 if they do, 404 if not.
    pub async fn exists_alias(&self, ctx: &Context, req: AliasExistsReq) -> Result<Response> {
        self.client.exists(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_paths() {
        let request = AliasPutReq {
            indices: vec!["movies-v2".into()],
            alias: "movies".into(),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/movies-v2/_alias/movies");

        let request = AliasGetReq::default().to_request().unwrap();
        assert_eq!(request.uri(), "/_alias");

        let request = AliasExistsReq {
            aliases: vec!["movies".into()],
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::HEAD);
        assert_eq!(request.uri(), "/_alias/movies");
    }

    #[test]
    fn test_delete_requires_alias() {
        let err = AliasDeleteReq {
            indices: vec!["movies-v2".into()],
            ..Default::default()
        }
        .to_request()
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("alias")));
    }
}
