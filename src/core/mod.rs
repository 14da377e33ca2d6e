//! Core domain models for the pipeline
//!
//! This module defines the chain definition (nodes and model), the
//! per-run trace, templates, and engine configuration.

pub mod config;
pub mod model;
pub mod node;
pub mod template;
pub mod trace;

pub use config::EngineConfig;
pub use model::{ModelError, PipelineModel, SerializedNode, SerializedPipeline};
pub use node::{merge_options, NodeDescriptor, NodeId, Options, PipelineNode};
pub use template::{Template, TemplateLibrary};
pub use trace::{ExecutionTrace, NodeResult, NodeStatus};
