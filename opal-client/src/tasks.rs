//! Task management.

use crate::endpoint::{header_field, request};
use crate::params::GroupBy;
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Task management endpoints. Obtained from [`Client::tasks`].
#[derive(Debug, Clone, Copy)]
pub struct Tasks<'a> {
    pub(crate) client: &'a Client,
}

params! {
    /// Parameters of [`TasksListReq`].
    pub struct TasksListParams {
        /// Only tasks whose action matches these patterns.
        actions: Vec<String>,
        /// Include detailed task information.
        detailed: Option<bool>,
        /// How to group the listed tasks.
        group_by: Option<GroupBy>,
        /// Only these nodes.
        nodes: Vec<String>,
        /// Only children of this task.
        parent_task_id: String,
        /// How long to wait for a response.
        timeout: Duration,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `GET /_tasks`
#[derive(Debug, Default)]
pub struct TasksListReq {
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TasksListParams,
}

impl Endpoint for TasksListReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(Method::GET, "/_tasks", None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`TasksListReq`].
///
/// Which field is filled depends on `group_by`: `nodes` for the default
/// grouping, `tasks` for `parents` and `none`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TasksListResp {
    /// Tasks grouped by node.
    pub nodes: HashMap<String, TaskNode>,
    /// Tasks, when not grouped by node.
    pub tasks: Value,
    /// Nodes that failed to report.
    pub node_failures: Vec<Value>,
    /// Tasks that failed.
    pub task_failures: Vec<Value>,
}

/// A node and the tasks running on it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskNode {
    /// Node name.
    pub name: String,
    /// Transport address.
    pub transport_address: String,
    /// Host name.
    pub host: String,
    /// IP address.
    pub ip: String,
    /// Node roles.
    pub roles: Vec<String>,
    /// Node attributes.
    pub attributes: HashMap<String, String>,
    /// Tasks keyed by `<node>:<id>`.
    pub tasks: HashMap<String, TaskInfo>,
}

/// One running task.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskInfo {
    /// Node running the task.
    pub node: String,
    /// Task id on that node.
    pub id: i64,
    /// Task type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Action name, such as `indices:data/write/reindex`.
    pub action: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Action-specific progress.
    pub status: Option<Value>,
    /// Start time, in epoch milliseconds.
    pub start_time_in_millis: i64,
    /// Running time, in nanoseconds.
    pub running_time_in_nanos: i64,
    /// Whether the task can be cancelled.
    pub cancellable: bool,
    /// Whether cancellation was requested.
    pub cancelled: Option<bool>,
    /// Parent task, as `<node>:<id>`.
    pub parent_task_id: Option<String>,
    /// Request headers recorded with the task.
    pub headers: HashMap<String, String>,
}

impl TaskInfo {
    /// The `<node>:<id>` form used to address the task.
    pub fn task_id(&self) -> String {
        format!("{}:{}", self.node, self.id)
    }

    /// The `X-Opaque-Id` the originating request carried.
    pub fn opaque_id(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(opal_core::OPAQUE_ID))
            .map(|(_, value)| value.as_str())
    }
}

params! {
    /// Parameters of [`TasksGetReq`].
    pub struct TasksGetParams {
        /// How long to wait for a response.
        timeout: Duration,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `GET /_tasks/<task_id>`
#[derive(Debug, Default)]
pub struct TasksGetReq {
    /// Task in `<node>:<id>` form.
    pub task_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TasksGetParams,
}

impl Endpoint for TasksGetReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_tasks")
            .part("task_id", &self.task_id)
            .build()?;
        request(Method::GET, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`TasksGetReq`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TasksGetResp {
    /// Whether the task has finished.
    pub completed: bool,
    /// The task itself.
    pub task: TaskInfo,
    /// Result of a completed task.
    pub response: Option<Value>,
    /// Failure of a completed task.
    pub error: Option<Value>,
}

params! {
    /// Parameters of [`TasksCancelReq`].
    pub struct TasksCancelParams {
        /// Only tasks whose action matches these patterns.
        actions: Vec<String>,
        /// Only these nodes.
        nodes: Vec<String>,
        /// Only children of this task.
        parent_task_id: String,
        /// Block until the operation completes.
        wait_for_completion: Option<bool>,
    }
}

/// `POST /_tasks/<task_id>?/_cancel`
#[derive(Debug, Default)]
pub struct TasksCancelReq {
    /// Task to cancel; empty cancels every task matching the parameters.
    pub task_id: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: TasksCancelParams,
}

impl Endpoint for TasksCancelReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_tasks")
            .optional(&self.task_id)
            .literal("_cancel")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

/// Body of [`TasksCancelReq`]: the cancelled tasks, in list form.
pub type TasksCancelResp = TasksListResp;

impl Tasks<'_> {
    /// List running tasks.
    pub async fn list(
        &self,
        ctx: &Context,
        req: Option<TasksListReq>,
    ) -> Result<Reply<TasksListResp>> {
        self.client.perform_json(ctx, req.unwrap_or_default()).await
    }

    /// Fetch one task.
    pub async fn get(&self, ctx: &Context, req: TasksGetReq) -> Result<Reply<TasksGetResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Cancel tasks.
    pub async fn cancel(
        &self,
        ctx: &Context,
        req: TasksCancelReq,
    ) -> Result<Reply<TasksCancelResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_paths() {
        let request = TasksGetReq {
            task_id: "oTUltX4IQMOUUVeiohTt8A:124".into(),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_tasks/oTUltX4IQMOUUVeiohTt8A:124");

        let request = TasksCancelReq {
            params: TasksCancelParams {
                actions: vec!["*reindex".into()],
                ..Default::default()
            },
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "/_tasks/_cancel?actions=*reindex");
    }

    #[test]
    fn test_list_response() {
        let resp: TasksListResp = serde_json::from_str(
            r#"{"nodes":{"n1":{"name":"node-1","tasks":{"n1:7":{
                "node":"n1","id":7,"type":"transport","action":"indices:data/write/reindex",
                "start_time_in_millis":1,"running_time_in_nanos":2,"cancellable":true,
                "headers":{"X-Opaque-Id":"job-42"}}}}}}"#,
        )
        .unwrap();
        let task = &resp.nodes["n1"].tasks["n1:7"];
        assert_eq!(task.task_id(), "n1:7");
        assert_eq!(task.opaque_id(), Some("job-42"));
    }
}
