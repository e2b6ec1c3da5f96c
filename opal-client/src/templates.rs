//! Composable index templates.

use crate::common::AcknowledgedResp;
use crate::endpoint::{header_field, request};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Response, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Index template endpoints. Obtained from [`Client::templates`].
#[derive(Debug, Clone, Copy)]
pub struct Templates<'a> {
    pub(crate) client: &'a Client,
}

params! {
    /// Parameters of [`TemplatePutReq`].
    pub struct TemplatePutParams {
        /// Reason recorded for the change.
        cause: String,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Fail if the resource already exists.
        create: Option<bool>,
    }
}

/// `PUT /_index_template/<name>`
#[derive(Debug, Default)]
pub struct TemplatePutReq {
    /// Template name.
    pub template: String,
    /// Patterns, priority and the template itself.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TemplatePutParams,
}

impl Endpoint for TemplatePutReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_index_template")
            .part("template", &self.template)
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`TemplateGetReq`] and [`TemplateExistsReq`].
    pub struct TemplateGetParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `GET /_index_template/<name>?`
#[derive(Debug, Default)]
pub struct TemplateGetReq {
    /// Template names or patterns; empty returns all.
    pub templates: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TemplateGetParams,
}

impl Endpoint for TemplateGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_index_template")
            .optional_list(&self.templates)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`TemplateGetReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateGetResp {
    /// Matching templates.
    pub index_templates: Vec<IndexTemplate>,
}

/// A named index template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexTemplate {
    /// Template name.
    pub name: String,
    /// Template definition.
    pub index_template: IndexTemplateDetails,
}

/// The definition of an index template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexTemplateDetails {
    /// Index name patterns the template applies to.
    pub index_patterns: Vec<String>,
    /// Precedence among matching templates.
    pub priority: Option<i64>,
    /// Caller-assigned version.
    pub version: Option<i64>,
    /// Component templates merged into this one.
    pub composed_of: Vec<String>,
    /// Settings, mappings and aliases applied to matching indices.
    pub template: Value,
    /// Caller metadata.
    #[serde(rename = "_meta")]
    pub meta: Option<Value>,
    /// Set when the template creates data streams.
    pub data_stream: Option<Value>,
}

params! {
    /// Parameters of [`TemplateDeleteReq`].
    pub struct TemplateDeleteParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `DELETE /_index_template/<name>`
#[derive(Debug, Default)]
pub struct TemplateDeleteReq {
    /// Template to delete.
    pub template: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TemplateDeleteParams,
}

impl Endpoint for TemplateDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_index_template")
            .part("template", &self.template)
            .build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// `HEAD /_index_template/<name>`
#[derive(Debug, Default)]
pub struct TemplateExistsReq {
    /// Template to check.
    pub template: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TemplateGetParams,
}

impl Endpoint for TemplateExistsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_index_template")
            .part("template", &self.template)
            .build()?;
        request(Method::HEAD, &path, None, &self.params, &self.header)
    }

    header_field!();
}

impl Templates<'_> {
    /// Create or replace an index template.
    pub async fn put(&self, ctx: &Context, req: TemplatePutReq) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Describe index templates.
    pub async fn get(
        &self,
        ctx: &Context,
        req: Option<TemplateGetReq>,
    ) -> Result<Reply<TemplateGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Delete an index template.
    pub async fn delete(
        &self,
        ctx: &Context,
        req: TemplateDeleteReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Check whether a template exists: 200 if it does, 404 if not.
    pub async fn exists(&self, ctx: &Context, req: TemplateExistsReq) -> Result<Response> {
        self.client.exists(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_paths() {
        let request = TemplateGetReq::default().to_request().unwrap();
        assert_eq!(request.uri(), "/_index_template");

        let request = TemplatePutReq {
            template: "logs".into(),
            body: Body::from(r#"{"index_patterns":["logs-*"]}"#),
            params: TemplatePutParams {
                create: Some(true),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_index_template/logs?create=true");

        let err = TemplateExistsReq::default().to_request().unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("template")));
    }

    #[test]
    fn test_get_response() {
        let resp: TemplateGetResp = serde_json::from_str(
            r#"{"index_templates":[{"name":"logs","index_template":{
                "index_patterns":["logs-*"],"priority":10,
                "template":{"settings":{"index":{"number_of_shards":"2"}}},
                "composed_of":[]}}]}"#,
        )
        .unwrap();
        let template = &resp.index_templates[0];
        assert_eq!(template.name, "logs");
        assert_eq!(template.index_template.priority, Some(10));
        assert_eq!(template.index_template.index_patterns, vec!["logs-*"]);
    }
}
