//! Pipeline model - the authoritative chain definition and source input

use crate::core::node::{merge_options, NodeDescriptor, NodeId, Options, PipelineNode};
use crate::registry::TransformRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reading a serialized pipeline
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid serialized pipeline: {0}")]
    Format(#[from] serde_json::Error),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(NodeId),
}

/// Persisted form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub node_id: NodeId,
    pub transform_id: String,
    #[serde(default)]
    pub options: Options,
    pub enabled: bool,
}

/// Persisted form of a pipeline: source input plus ordered nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedPipeline {
    pub input: String,
    pub nodes: Vec<SerializedNode>,
}

/// Ordered chain of nodes plus the source input
///
/// Sequence order is execution order. Node ids are unique within the chain.
/// Every operation leaves the chain structurally valid; referencing an
/// unknown transform is a runtime concern, not a structural one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineModel {
    input: String,
    nodes: Vec<PipelineNode>,
}

impl PipelineModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn nodes(&self) -> &[PipelineNode] {
        &self.nodes
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&PipelineNode> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    pub fn position(&self, node_id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replace the source input. Any string is accepted.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Append a node for `transform_id` with defaults merged under `options`.
    ///
    /// Unknown transform ids are a caller bug: nothing is added and `None`
    /// is returned.
    pub fn add_node(
        &mut self,
        registry: &TransformRegistry,
        transform_id: &str,
        options: Option<Options>,
    ) -> Option<NodeId> {
        let node = Self::build_node(registry, transform_id, options)?;
        let id = node.id.clone();
        debug!("Added node {} ({})", id, transform_id);
        self.nodes.push(node);
        Some(id)
    }

    /// Remove a node. Returns whether anything was removed.
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        match self.position(node_id) {
            Some(index) => {
                self.nodes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move a node to `new_index`, clamped to the chain bounds.
    /// Returns whether the order changed.
    pub fn move_node(&mut self, node_id: &NodeId, new_index: usize) -> bool {
        let Some(from) = self.position(node_id) else {
            return false;
        };
        let to = new_index.min(self.nodes.len() - 1);
        if from == to {
            return false;
        }
        let node = self.nodes.remove(from);
        self.nodes.insert(to, node);
        true
    }

    /// Shallow-merge `partial` into a node's options. Unknown keys are kept.
    pub fn update_node_options(&mut self, node_id: &NodeId, partial: &Options) -> bool {
        match self.nodes.iter_mut().find(|n| &n.id == node_id) {
            Some(node) => {
                node.options = merge_options(&node.options, partial);
                true
            }
            None => false,
        }
    }

    /// Flip a node's enabled flag, returning the new value
    pub fn toggle_node(&mut self, node_id: &NodeId) -> Option<bool> {
        let node = self.nodes.iter_mut().find(|n| &n.id == node_id)?;
        node.enabled = !node.enabled;
        Some(node.enabled)
    }

    /// Replace the whole chain. Descriptors naming unknown transforms are
    /// dropped; the rest keep their relative order. The input is untouched.
    pub fn load_template(&mut self, registry: &TransformRegistry, descriptors: &[NodeDescriptor]) {
        let nodes: Vec<PipelineNode> = descriptors
            .iter()
            .filter_map(|d| Self::build_node(registry, &d.transform_id, d.options.clone()))
            .collect();

        if nodes.len() != descriptors.len() {
            warn!(
                "Dropped {} template node(s) with unknown transforms",
                descriptors.len() - nodes.len()
            );
        }

        self.nodes = nodes;
    }

    fn build_node(
        registry: &TransformRegistry,
        transform_id: &str,
        options: Option<Options>,
    ) -> Option<PipelineNode> {
        let Some(transform) = registry.lookup(transform_id) else {
            warn!("Ignoring unknown transform: {}", transform_id);
            return None;
        };
        let options = merge_options(&transform.default_options(), &options.unwrap_or_default());
        Some(PipelineNode::new(transform_id, options))
    }

    /// Persisted form of this model. Node ids are preserved.
    pub fn serialize(&self) -> SerializedPipeline {
        SerializedPipeline {
            input: self.input.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|n| SerializedNode {
                    node_id: n.id.clone(),
                    transform_id: n.transform_id.clone(),
                    options: n.options.clone(),
                    enabled: n.enabled,
                })
                .collect(),
        }
    }

    /// Rebuild a model from its persisted form.
    ///
    /// Nodes are restored as-is, including ones whose transform is not
    /// registered; those fail at run time. Duplicate ids are rejected.
    pub fn from_serialized(serialized: SerializedPipeline) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for node in &serialized.nodes {
            if !seen.insert(node.node_id.clone()) {
                return Err(ModelError::DuplicateNodeId(node.node_id.clone()));
            }
        }

        Ok(Self {
            input: serialized.input,
            nodes: serialized
                .nodes
                .into_iter()
                .map(|n| PipelineNode {
                    id: n.node_id,
                    transform_id: n.transform_id,
                    options: n.options,
                    enabled: n.enabled,
                })
                .collect(),
        })
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let serialized: SerializedPipeline = serde_json::from_str(json)?;
        Self::from_serialized(serialized)
    }
}
