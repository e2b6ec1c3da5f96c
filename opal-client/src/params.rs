//! Enumerated parameter values.

use opal_core::param_enum;

param_enum! {
    /// When changes made by a request become visible to search.
    pub enum Refresh {
        /// Refresh the affected shards immediately.
        True => "true",
        /// Do nothing refresh-related.
        False => "false",
        /// Wait for the next scheduled refresh.
        WaitFor => "wait_for",
    }
}

param_enum! {
    /// Which index states wildcard expressions expand to.
    pub enum ExpandWildcards {
        /// Open and closed indices.
        All => "all",
        /// Open indices only.
        Open => "open",
        /// Closed indices only.
        Closed => "closed",
        /// Hidden indices too.
        Hidden => "hidden",
        /// No expansion.
        None => "none",
    }
}

param_enum! {
    /// How an index request treats an existing document.
    pub enum OpType {
        /// Create or overwrite.
        Index => "index",
        /// Fail if the document exists.
        Create => "create",
    }
}

param_enum! {
    /// Versioning scheme for optimistic concurrency.
    pub enum VersionType {
        /// Internal versioning.
        Internal => "internal",
        /// External version must be greater.
        External => "external",
        /// External version must be greater or equal.
        ExternalGte => "external_gte",
    }
}

param_enum! {
    /// What by-query operations do on version conflicts.
    pub enum Conflicts {
        /// Stop the operation.
        Abort => "abort",
        /// Count the conflict and continue.
        Proceed => "proceed",
    }
}

param_enum! {
    /// How scores are computed across shards.
    pub enum SearchType {
        /// Score with shard-local term frequencies.
        QueryThenFetch => "query_then_fetch",
        /// Score with global term frequencies.
        DfsQueryThenFetch => "dfs_query_then_fetch",
    }
}

param_enum! {
    /// Default operator of a query string.
    pub enum DefaultOperator {
        /// Any term may match.
        Or => "OR",
        /// All terms must match.
        And => "AND",
    }
}

param_enum! {
    /// Detail level of cluster health.
    pub enum HealthLevel {
        /// Cluster summary.
        Cluster => "cluster",
        /// Per index.
        Indices => "indices",
        /// Per shard.
        Shards => "shards",
        /// Per awareness attribute.
        AwarenessAttributes => "awareness_attributes",
    }
}

param_enum! {
    /// Cluster or index health.
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum HealthStatus {
        /// All shards allocated.
        Green => "green",
        /// Replicas unassigned.
        Yellow => "yellow",
        /// Primaries unassigned.
        Red => "red",
    }
}

param_enum! {
    /// How listed tasks are grouped.
    pub enum GroupBy {
        /// By node.
        Nodes => "nodes",
        /// By parent task.
        Parents => "parents",
        /// Flat list.
        None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::ParamValue;

    #[test]
    fn test_wire_values() {
        assert_eq!(Refresh::WaitFor.as_str(), "wait_for");
        assert_eq!(ExpandWildcards::All.to_string(), "all");
        assert_eq!(DefaultOperator::And.to_param().as_deref(), Some("AND"));
        assert_eq!(VersionType::ExternalGte.as_str(), "external_gte");
    }

    #[test]
    fn test_enum_lists_are_comma_joined() {
        use opal_core::Param;
        let expand = vec![ExpandWildcards::Open, ExpandWildcards::Hidden];
        assert_eq!(expand.encode().as_deref(), Some("open,hidden"));
    }
}
