//! Pipeline execution: the engine, the reactive scheduler, and the session
//! that ties a model to both

pub mod engine;
pub mod scheduler;
pub mod session;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use scheduler::{PublishedTrace, ReactiveScheduler, SchedulerError};
pub use session::PipelineSession;
