//! Snapshot repositories and snapshots.

use crate::common::{AcknowledgedResp, ShardsInfo};
use crate::endpoint::{header_field, request};
use crate::Client;
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Snapshot and repository endpoints. Obtained from [`Client::snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub(crate) client: &'a Client,
}

// =========================================================================
// Repositories
// =========================================================================

params! {
    /// Parameters of [`RepositoryCreateReq`].
    pub struct RepositoryCreateParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
        /// Verify the repository on every node.
        verify: Option<bool>,
    }
}

/// `PUT /_snapshot/<repository>`
#[derive(Debug, Default)]
pub struct RepositoryCreateReq {
    /// Repository name.
    pub repository: String,
    /// Repository type and settings.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: RepositoryCreateParams,
}

impl Endpoint for RepositoryCreateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`RepositoryGetReq`].
    pub struct RepositoryGetParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Read from the local node instead of the cluster manager.
        local: Option<bool>,
    }
}

/// `GET /_snapshot/<repository>?`
#[derive(Debug, Default)]
pub struct RepositoryGetReq {
    /// Repositories to describe; empty describes all.
    pub repositories: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: RepositoryGetParams,
}

impl Endpoint for RepositoryGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .optional_list(&self.repositories)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`RepositoryGetReq`], keyed by repository name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RepositoryGetResp {
    /// Repository definitions.
    pub repositories: HashMap<String, RepositoryDetails>,
}

/// One repository definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepositoryDetails {
    /// Repository type (`fs`, `s3`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific settings.
    pub settings: Value,
}

params! {
    /// Parameters of [`RepositoryDeleteReq`].
    pub struct RepositoryDeleteParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// How long to wait for a response.
        timeout: Duration,
    }
}

/// `DELETE /_snapshot/<repository>`
#[derive(Debug, Default)]
pub struct RepositoryDeleteReq {
    /// Repositories to unregister.
    pub repositories: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: RepositoryDeleteParams,
}

impl Endpoint for RepositoryDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .list("repository", &self.repositories)
            .build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

// =========================================================================
// Snapshots
// =========================================================================

params! {
    /// Parameters of [`SnapshotCreateReq`].
    pub struct SnapshotCreateParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `PUT /_snapshot/<repository>/<snapshot>`
#[derive(Debug, Default)]
pub struct SnapshotCreateReq {
    /// Repository to write to.
    pub repository: String,
    /// Snapshot name.
    pub snapshot: String,
    /// Indices and options; without one every index is captured.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotCreateParams,
}

impl Endpoint for SnapshotCreateReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .part("snapshot", &self.snapshot)
            .build()?;
        request(Method::PUT, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SnapshotCreateReq`].
///
/// Without `wait_for_completion` the server only acknowledges the request
/// and `snapshot` is absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotCreateResp {
    /// Set when the request returned before completion.
    pub accepted: Option<bool>,
    /// The snapshot, when the call waited for completion.
    pub snapshot: Option<SnapshotInfo>,
}

/// Description of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotInfo {
    /// Snapshot name.
    pub snapshot: String,
    /// Snapshot UUID.
    pub uuid: String,
    /// Server version that took the snapshot.
    pub version: Option<String>,
    /// Indices in the snapshot.
    pub indices: Vec<String>,
    /// Data streams in the snapshot.
    pub data_streams: Vec<String>,
    /// Whether cluster state was included.
    pub include_global_state: Option<bool>,
    /// `IN_PROGRESS`, `SUCCESS`, `FAILED`, `PARTIAL` or `INCOMPATIBLE`.
    pub state: Option<String>,
    /// Start time.
    pub start_time: Option<DateTime<Utc>>,
    /// Start time, in epoch milliseconds.
    pub start_time_in_millis: Option<i64>,
    /// End time.
    pub end_time: Option<DateTime<Utc>>,
    /// End time, in epoch milliseconds.
    pub end_time_in_millis: Option<i64>,
    /// Time taken, in milliseconds.
    pub duration_in_millis: Option<i64>,
    /// Shard failures.
    pub failures: Vec<Value>,
    /// Shard counts.
    pub shards: Option<ShardsInfo>,
}

params! {
    /// Parameters of [`SnapshotGetReq`].
    pub struct SnapshotGetParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
        /// Include full snapshot details.
        verbose: Option<bool>,
    }
}

/// `GET /_snapshot/<repository>/<snapshot>`
#[derive(Debug, Default)]
pub struct SnapshotGetReq {
    /// Repository to read.
    pub repository: String,
    /// Snapshot names or patterns (`_all`, `nightly-*`).
    pub snapshots: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotGetParams,
}

impl Endpoint for SnapshotGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .list("snapshot", &self.snapshots)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SnapshotGetReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotGetResp {
    /// Matching snapshots.
    pub snapshots: Vec<SnapshotInfo>,
}

params! {
    /// Parameters of [`SnapshotDeleteReq`].
    pub struct SnapshotDeleteParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
    }
}

/// `DELETE /_snapshot/<repository>/<snapshot>`
#[derive(Debug, Default)]
pub struct SnapshotDeleteReq {
    /// Repository holding the snapshot.
    pub repository: String,
    /// Snapshot to delete.
    pub snapshot: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotDeleteParams,
}

impl Endpoint for SnapshotDeleteReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .part("snapshot", &self.snapshot)
            .build()?;
        request(Method::DELETE, &path, None, &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`SnapshotRestoreReq`].
    pub struct SnapshotRestoreParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /_snapshot/<repository>/<snapshot>/_restore`
#[derive(Debug, Default)]
pub struct SnapshotRestoreReq {
    /// Repository holding the snapshot.
    pub repository: String,
    /// Snapshot to restore.
    pub snapshot: String,
    /// Indices, renames and overrides.
    pub body: Option<Body>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotRestoreParams,
}

impl Endpoint for SnapshotRestoreReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .part("snapshot", &self.snapshot)
            .literal("_restore")
            .build()?;
        request(Method::POST, &path, self.body, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SnapshotRestoreReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotRestoreResp {
    /// Set when the request returned before completion.
    pub accepted: Option<bool>,
    /// The restore, when the call waited for completion.
    pub snapshot: Option<SnapshotRestoreInfo>,
}

/// Outcome of a completed restore.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotRestoreInfo {
    /// Snapshot name.
    pub snapshot: String,
    /// Restored indices.
    pub indices: Vec<String>,
    /// Shard counts.
    pub shards: Option<ShardsInfo>,
}

params! {
    /// Parameters of [`SnapshotCloneReq`].
    pub struct SnapshotCloneParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
    }
}

/// `PUT /_snapshot/<repository>/<snapshot>/_clone/<target>`
#[derive(Debug, Default)]
pub struct SnapshotCloneReq {
    /// Repository holding both snapshots.
    pub repository: String,
    /// Source snapshot.
    pub snapshot: String,
    /// Name of the clone.
    pub target_snapshot: String,
    /// `{"indices": "..."}` selecting what to copy.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotCloneParams,
}

impl Endpoint for SnapshotCloneReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_snapshot")
            .part("repository", &self.repository)
            .part("snapshot", &self.snapshot)
            .literal("_clone")
            .part("target_snapshot", &self.target_snapshot)
            .build()?;
        request(Method::PUT, &path, Some(self.body), &self.params, &self.header)
    }

    header_field!();
}

params! {
    /// Parameters of [`SnapshotStatusReq`].
    pub struct SnapshotStatusParams {
        /// How long to wait for the cluster manager.
        cluster_manager_timeout: Duration,
        /// Ignore missing or closed indices.
        ignore_unavailable: Option<bool>,
    }
}

/// `GET /_snapshot/<repository>?/<snapshot>?/_status`
///
/// Without a repository, reports the snapshots currently running.
#[derive(Debug, Default)]
pub struct SnapshotStatusReq {
    /// Repository to look in.
    pub repository: String,
    /// Snapshots to report on. Requires a repository.
    pub snapshots: Vec<String>,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: SnapshotStatusParams,
}

impl Endpoint for SnapshotStatusReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let mut path = PathBuilder::new().literal("_snapshot");
        path = if self.snapshots.is_empty() {
            path.optional(&self.repository)
        } else {
            path.part("repository", &self.repository)
                .list("snapshot", &self.snapshots)
        };
        let path = path.literal("_status").build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`SnapshotStatusReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotStatusResp {
    /// Per-snapshot progress.
    pub snapshots: Vec<SnapshotStatus>,
}

/// Progress of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotStatus {
    /// Snapshot name.
    pub snapshot: String,
    /// Repository holding the snapshot.
    pub repository: String,
    /// Snapshot UUID.
    pub uuid: String,
    /// Current state.
    pub state: String,
    /// Whether cluster state is included.
    pub include_global_state: Option<bool>,
    /// Shard counts by stage.
    pub shards_stats: Value,
    /// File and size statistics.
    pub stats: Value,
    /// Per-index progress.
    pub indices: HashMap<String, Value>,
}

impl Snapshot<'_> {
    /// Register a snapshot repository.
    pub async fn create_repository(
        &self,
        ctx: &Context,
        req: RepositoryCreateReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Describe snapshot repositories.
    pub async fn get_repository(
        &self,
        ctx: &Context,
        req: Option<RepositoryGetReq>,
    ) -> Result<Reply<RepositoryGetResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Unregister snapshot repositories.
    pub async fn delete_repository(
        &self,
        ctx: &Context,
        req: RepositoryDeleteReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Take a snapshot.
    pub async fn create(
        &self,
        ctx: &Context,
        req: SnapshotCreateReq,
    ) -> Result<Reply<SnapshotCreateResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Describe snapshots.
    pub async fn get(&self, ctx: &Context, req: SnapshotGetReq) -> Result<Reply<SnapshotGetResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Delete a snapshot.
    pub async fn delete(
        &self,
        ctx: &Context,
        req: SnapshotDeleteReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Restore a snapshot.
    pub async fn restore(
        &self,
        ctx: &Context,
        req: SnapshotRestoreReq,
    ) -> Result<Reply<SnapshotRestoreResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Copy part of a snapshot into a new one.
    pub async fn clone(
        &self,
        ctx: &Context,
        req: SnapshotCloneReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Shard-level progress of snapshots.
    pub async fn status(
        &self,
        ctx: &Context,
        req: Option<SnapshotStatusReq>,
    ) -> Result<Reply<SnapshotStatusResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }
}
