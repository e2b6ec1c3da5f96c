//! Response fragments shared across endpoint families.

use serde::Deserialize;

/// Shard-level outcome of a request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShardsInfo {
    /// Shards the request was sent to.
    pub total: u32,
    /// Shards that succeeded.
    pub successful: u32,
    /// Shards that failed.
    pub failed: u32,
    /// Shards skipped because they could not match.
    #[serde(default)]
    pub skipped: Option<u32>,
    /// Per-shard failure details.
    #[serde(default)]
    pub failures: Vec<ShardFailure>,
}

/// One failed shard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShardFailure {
    /// Shard number.
    pub shard: Option<i64>,
    /// Index name.
    pub index: Option<String>,
    /// Node id.
    pub node: Option<String>,
    /// Failure status.
    pub status: Option<String>,
    /// The failure itself.
    pub reason: serde_json::Value,
}

/// Body of endpoints that only acknowledge a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AcknowledgedResp {
    /// Whether the change was accepted.
    pub acknowledged: bool,
}

/// Acknowledgement that also reports shard readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShardsAcknowledgedResp {
    /// Whether the change was accepted.
    pub acknowledged: bool,
    /// Whether the required shard copies started in time.
    #[serde(default)]
    pub shards_acknowledged: bool,
}

/// Progress counters reported by by-query operations and reindex.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ByQueryResp {
    /// Milliseconds taken.
    pub took: u64,
    /// Whether any request timed out.
    pub timed_out: bool,
    /// Documents processed.
    pub total: u64,
    /// Documents updated.
    pub updated: u64,
    /// Documents created.
    pub created: u64,
    /// Documents deleted.
    pub deleted: u64,
    /// Scroll batches pulled.
    pub batches: u64,
    /// Version conflicts hit.
    pub version_conflicts: u64,
    /// Documents skipped because a script set `ctx.op` to `noop`.
    pub noops: u64,
    /// Bulk and search retries.
    pub retries: Retries,
    /// Milliseconds spent throttled.
    pub throttled_millis: u64,
    /// Requests per second applied.
    pub requests_per_second: f64,
    /// Failures, if any.
    pub failures: Vec<serde_json::Value>,
    /// Task id when run with `wait_for_completion=false`.
    pub task: Option<String>,
}

/// Retry counters of by-query operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Retries {
    /// Bulk retries.
    pub bulk: u64,
    /// Search retries.
    pub search: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shards_info_minimal() {
        let shards: ShardsInfo =
            serde_json::from_str(r#"{"total":2,"successful":1,"failed":0}"#).unwrap();
        assert_eq!(shards.successful, 1);
        assert!(shards.skipped.is_none());
        assert!(shards.failures.is_empty());
    }

    #[test]
    fn test_by_query_task_only() {
        let resp: ByQueryResp = serde_json::from_str(r#"{"task":"node:42"}"#).unwrap();
        assert_eq!(resp.task.as_deref(), Some("node:42"));
        assert_eq!(resp.total, 0);
    }
}
