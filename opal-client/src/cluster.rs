//! Cluster health, state, stats and settings.

use crate::endpoint::{header_field, request};
use crate::params::{ExpandWildcards, HealthLevel, HealthStatus};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Cluster endpoints. Obtained from [`Client::cluster`].
#[derive(Debug, Clone, Copy)]
pub struct Cluster<'a> {
    pub(crate) client: &'a Client,
}

// =========================================================================
// Health
// =========================================================================

params! {
    /// Parameters of [`ClusterHealthReq`].
    pub struct ClusterHealthParams {
        /// Awareness attribute to report health for.
        awareness_attribute: String,
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Index states that wildcards expand to.
        expand_wildcards: Vec<ExpandWildcards>,
        /// Detail level of the report.
        level: Option<HealthLevel>,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
        /// Active shard copies required before proceeding.
        wait_for_active_shards: String,
        /// Wait until queued events of this priority are processed.
        wait_for_events: String,
        /// Wait until no shard is initializing.
        wait_for_no_initializing_shards: Option<bool>,
        /// Wait until no shard is relocating.
        wait_for_no_relocating_shards: Option<bool>,
        /// Wait for this many nodes, such as `>=3`.
        wait_for_nodes: String,
        /// Wait for this health status.
        wait_for_status: Option<HealthStatus>,
    }
}

/// `GET /_cluster/health/<index>?`
#[derive(Debug, Default)]
pub struct ClusterHealthReq {
    /// Limit the report to these indices.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ClusterHealthParams,
}

impl Endpoint for ClusterHealthReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_cluster")
            .literal("health")
            .optional_list(&self.indices)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`ClusterHealthReq`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterHealthResp {
    /// Name of the cluster.
    pub cluster_name: String,
    /// Overall health.
    pub status: HealthStatus,
    /// Whether the wait conditions timed out.
    pub timed_out: bool,
    /// Nodes in the cluster.
    pub number_of_nodes: u32,
    /// Data nodes in the cluster.
    pub number_of_data_nodes: u32,
    /// Active primary shards.
    pub active_primary_shards: u32,
    /// Active primary and replica shards.
    pub active_shards: u32,
    /// Shards being relocated.
    pub relocating_shards: u32,
    /// Shards being initialized.
    pub initializing_shards: u32,
    /// Shards not allocated to any node.
    pub unassigned_shards: u32,
    /// Unassigned shards whose allocation is delayed.
    #[serde(default)]
    pub delayed_unassigned_shards: u32,
    /// Cluster-level changes not yet executed.
    #[serde(default)]
    pub number_of_pending_tasks: u32,
    /// Unfinished shard fetches.
    #[serde(default)]
    pub number_of_in_flight_fetch: u32,
    /// Longest time a pending task has waited.
    #[serde(default)]
    pub task_max_waiting_in_queue_millis: u64,
    /// Share of active shards, as a percentage.
    #[serde(default)]
    pub active_shards_percent_as_number: f64,
    /// Present when `level` is `indices` or `shards`.
    #[serde(default)]
    pub indices: HashMap<String, Value>,
}

// =========================================================================
// State and stats
// =========================================================================

params! {
    /// Parameters of [`ClusterStateReq`].
    pub struct ClusterStateParams {
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
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
        /// Wait for this metadata version.
        wait_for_metadata_version: Option<i64>,
        /// How long to wait for the metadata version.
        wait_for_timeout: Duration,
    }
}

/// `GET /_cluster/state/<metric>?/<index>?`
#[derive(Debug, Default)]
pub struct ClusterStateReq {
    /// Metrics to return (`metadata`, `routing_table`, ...); empty returns all.
    pub metrics: Vec<String>,
    /// Limit the state to these indices. Requires at least one metric.
    pub indices: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ClusterStateParams,
}

impl Endpoint for ClusterStateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let mut path = PathBuilder::new().literal("_cluster").literal("state");
        path = if self.indices.is_empty() {
            path.optional_list(&self.metrics)
        } else {
            path.list("metric", &self.metrics).list("index", &self.indices)
        };
        request(Method::GET, &path.build()?, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`ClusterStateReq`]. Its shape depends on the requested metrics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ClusterStateResp {
    /// The state document.
    pub state: Value,
}

params! {
    /// Parameters of [`ClusterStatsReq`].
    pub struct ClusterStatsParams {
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `GET /_cluster/stats`
#[derive(Debug, Default)]
pub struct ClusterStatsReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ClusterStatsParams,
}

impl Endpoint for ClusterStatsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::GET,
            "/_cluster/stats",
            None,
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// Body of [`ClusterStatsReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterStatsResp {
    /// Name of the cluster.
    pub cluster_name: String,
    /// UUID of the cluster.
    pub cluster_uuid: String,
    /// Time the stats were collected, in epoch milliseconds.
    pub timestamp: i64,
    /// Overall health.
    pub status: Option<HealthStatus>,
    /// Index-level statistics.
    pub indices: Value,
    /// Node-level statistics.
    pub nodes: Value,
}

// =========================================================================
// Settings
// =========================================================================

params! {
    /// Parameters of [`ClusterGetSettingsReq`].
    pub struct ClusterGetSettingsParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// Include default settings.
        include_defaults: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `GET /_cluster/settings`
#[derive(Debug, Default)]
pub struct ClusterGetSettingsReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ClusterGetSettingsParams,
}

impl Endpoint for ClusterGetSettingsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::GET,
            "/_cluster/settings",
            None,
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// Body of [`ClusterGetSettingsReq`] and [`ClusterPutSettingsReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterSettingsResp {
    /// Set by [`ClusterPutSettingsReq`].
    pub acknowledged: Option<bool>,
    /// Settings that survive a full cluster restart.
    pub persistent: Value,
    /// Settings that last until the next full restart.
    pub transient: Value,
    /// Present when `include_defaults` was set.
    pub defaults: Option<Value>,
}

params! {
    /// Parameters of [`ClusterPutSettingsReq`].
    pub struct ClusterPutSettingsParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Return settings in flat form.
        flat_settings: Option<bool>,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `PUT /_cluster/settings`
#[derive(Debug, Default)]
pub struct ClusterPutSettingsReq {
    /// `persistent` and/or `transient` settings.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: ClusterPutSettingsParams,
}

impl Endpoint for ClusterPutSettingsReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::PUT,
            "/_cluster/settings",
            Some(self.body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

impl Cluster<'_> {
    /// Cluster health.
    pub async fn health(
        &self,
        ctx: &Context,
        req: Option<ClusterHealthReq>,
    ) -> Result<Reply<ClusterHealthResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Cluster state.
    pub async fn state(
        &self,
        ctx: &Context,
        req: Option<ClusterStateReq>,
    ) -> Result<Reply<ClusterStateResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Cluster-wide statistics.
    pub async fn stats(
        &self,
        ctx: &Context,
        req: Option<ClusterStatsReq>,
    ) -> Result<Reply<ClusterStatsResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Read cluster settings.
    pub async fn get_settings(
        &self,
        ctx: &Context,
        req: Option<ClusterGetSettingsReq>,
    ) -> Result<Reply<ClusterSettingsResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Update cluster settings.
    pub async fn put_settings(
        &self,
        ctx: &Context,
        req: ClusterPutSettingsReq,
    ) -> Result<Reply<ClusterSettingsResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_path() {
        let request = ClusterHealthReq {
            indices: vec!["movies".into()],
            params: ClusterHealthParams {
                level: Some(HealthLevel::Indices),
                wait_for_status: Some(HealthStatus::Yellow),
                timeout: Duration::from_secs(5),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(
            request.uri(),
            "/_cluster/health/movies?level=indices&timeout=5000ms&wait_for_status=yellow"
        );
    }

    #[test]
    fn test_state_paths() {
        let request = ClusterStateReq::default().to_request().unwrap();
        assert_eq!(request.uri(), "/_cluster/state");

        let request = ClusterStateReq {
            metrics: vec!["metadata".into()],
            indices: vec!["movies".into()],
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_cluster/state/metadata/movies");

        let err = ClusterStateReq {
            indices: vec!["movies".into()],
            ..Default::default()
        }
        .to_request()
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("metric")));
    }

    #[test]
    fn test_health_response() {
        let resp: ClusterHealthResp = serde_json::from_str(
            r#"{"cluster_name":"docker-cluster","status":"yellow","timed_out":false,
                "number_of_nodes":1,"number_of_data_nodes":1,"active_primary_shards":5,
                "active_shards":5,"relocating_shards":0,"initializing_shards":0,
                "unassigned_shards":2,"active_shards_percent_as_number":71.4}"#,
        )
        .unwrap();
        assert_eq!(resp.status, HealthStatus::Yellow);
        assert_eq!(resp.unassigned_shards, 2);
        assert!(resp.indices.is_empty());
    }
}
