//! Pipeline node domain model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Option values for a transform, keyed by option name
pub type Options = serde_json::Map<String, Value>;

/// Overlay `overlay` on top of `base`, key by key (shallow)
pub fn merge_options(base: &Options, overlay: &Options) -> Options {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Process-unique node identifier
///
/// Generated ids are UUIDs and are never reused. Ids read back from a
/// serialized pipeline are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        NodeId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// One configured transform instance within a chain
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineNode {
    /// Stable identifier, survives reorders
    pub id: NodeId,

    /// Key into the transform registry
    pub transform_id: String,

    /// Current configuration
    pub options: Options,

    /// Disabled nodes are skipped but stay in the chain
    pub enabled: bool,
}

impl PipelineNode {
    /// Create an enabled node with a fresh id
    pub fn new(transform_id: impl Into<String>, options: Options) -> Self {
        Self {
            id: NodeId::generate(),
            transform_id: transform_id.into(),
            options,
            enabled: true,
        }
    }

    /// Options the transform is invoked with: defaults for missing keys,
    /// node options everywhere else
    pub fn effective_options(&self, defaults: &Options) -> Options {
        merge_options(defaults, &self.options)
    }
}

/// A node as described by a template: a transform id plus optional options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub transform_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

impl NodeDescriptor {
    pub fn new(transform_id: impl Into<String>) -> Self {
        Self {
            transform_id: transform_id.into(),
            options: None,
        }
    }

    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options
            .get_or_insert_with(Options::new)
            .insert(key.to_string(), value);
        self
    }
}
