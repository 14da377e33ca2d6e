//! Execution trace - the per-run record of what each node did

use crate::core::node::NodeId;
use serde::{Deserialize, Serialize};

/// Outcome of a single node within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Transform produced an output
    Success,
    /// Transform failed or could not be resolved; the run stopped here
    Error,
    /// Node was disabled; input passed through unchanged
    Skipped,
}

/// What happened at one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: NodeId,

    pub transform_id: String,

    pub status: NodeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeResult {
    pub fn success(node_id: NodeId, transform_id: String, output: String) -> Self {
        Self {
            node_id,
            transform_id,
            status: NodeStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn skipped(node_id: NodeId, transform_id: String, passthrough: String) -> Self {
        Self {
            node_id,
            transform_id,
            status: NodeStatus::Skipped,
            output: Some(passthrough),
            error: None,
        }
    }

    pub fn error(node_id: NodeId, transform_id: String, error: String) -> Self {
        Self {
            node_id,
            transform_id,
            status: NodeStatus::Error,
            output: None,
            error: Some(error),
        }
    }
}

/// Result of one run over a chain
///
/// Results appear in chain order and stop at the first error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    pub results: Vec<NodeResult>,

    /// Last successfully produced value, or the source input
    pub final_output: String,
}

impl ExecutionTrace {
    /// The node the run stopped at, if it stopped early
    pub fn failed_node(&self) -> Option<&NodeResult> {
        self.results.iter().find(|r| r.status == NodeStatus::Error)
    }

    /// True when no node errored
    pub fn is_complete(&self) -> bool {
        self.failed_node().is_none()
    }

    pub fn result_for(&self, node_id: &NodeId) -> Option<&NodeResult> {
        self.results.iter().find(|r| &r.node_id == node_id)
    }

    pub fn count(&self, status: NodeStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
