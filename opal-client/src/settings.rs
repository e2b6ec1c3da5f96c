//! Index settings.

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
    /// Parameters of [`SettingsGetReq`].
    pub struct SettingsGetParams {
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

/// `GET /<index>?/_settings/<name>?`
#[derive(Debug, Default)]
pub struct SettingsGetReq {
    /// Indices to read; empty reads all.
    pub indices: Vec<String>,
    /// Setting names or patterns; empty returns every setting.
    pub settings: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SettingsGetParams,
}

impl Endpoint for SettingsGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_settings")
            .optional_list(&self.settings)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SettingsGetReq`], keyed by index name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SettingsGetResp {
    /// Settings per index.
    pub indices: HashMap<String, IndexSettings>,
}

/// Settings of one index.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Explicit settings.
    pub settings: Value,
    /// Defaults, when `include_defaults` was set.
    pub defaults: Option<Value>,
}

params! {
    /// Parameters of [`SettingsPutReq`].
    pub struct SettingsPutParams {
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
        /// Keep settings that are already set.
        preserve_existing: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `PUT /<index>?/_settings`
#[derive(Debug, Default)]
pub struct SettingsPutReq {
    /// Indices to update; empty updates all.
    pub indices: Vec<String>,
    /// Settings to apply.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SettingsPutParams,
}

impl Endpoint for SettingsPutReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .optional_list(&self.indices)
            .literal("_settings")
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

impl Indices<'_> {
    /// Read index settings.
    pub async fn get_settings(
        &self,
        ctx: &Context,
        req: Option<SettingsGetReq>,
    ) -> Result<Reply<SettingsGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Change dynamic index settings.
    pub async fn put_settings(
        &self,
        ctx: &Context,
        req: SettingsPutReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_paths() {
        let request = SettingsGetReq {
            indices: vec!["movies".into()],
            settings: vec!["index.number_of_*".into()],
            params: SettingsGetParams {
                flat_settings: Some(true),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(
            request.uri(),
            "/movies/_settings/index.number_of_*?flat_settings=true"
        );

        let request = SettingsPutReq {
            body: Body::from(r#"{"index":{"refresh_interval":"5s"}}"#),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/_settings");
    }
}
