//! toolpipe - chain developer utilities into a reactive transform pipeline

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod registry;

// Re-export commonly used types
pub use core::{ExecutionTrace, NodeId, NodeStatus, Options, PipelineModel, Template};
pub use execution::{ExecutionEngine, ExecutionEvent, PipelineSession, ReactiveScheduler};
pub use registry::{Transform, TransformError, TransformRegistry};
