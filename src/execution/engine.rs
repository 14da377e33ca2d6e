//! Main execution engine - runs a chain snapshot and builds its trace

use crate::{
    core::{ExecutionTrace, NodeId, NodeResult, Options, PipelineModel},
    registry::{Transform, TransformError, TransformRegistry},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        node_count: usize,
    },
    NodeStarted {
        node_id: NodeId,
        transform_id: String,
    },
    NodeSucceeded {
        node_id: NodeId,
    },
    NodeSkipped {
        node_id: NodeId,
    },
    NodeFailed {
        node_id: NodeId,
        error: String,
    },
    RunFinished {
        run_id: Uuid,
        halted_at: Option<NodeId>,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs chains against the transform registry
///
/// The engine never fails: every problem ends up in the returned trace.
pub struct ExecutionEngine {
    registry: Arc<TransformRegistry>,
    transform_timeout: Option<Duration>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl ExecutionEngine {
    pub fn new(registry: Arc<TransformRegistry>) -> Self {
        Self {
            registry,
            transform_timeout: None,
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Bound each transform invocation. `None` means no limit.
    pub fn with_transform_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transform_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<TransformRegistry> {
        &self.registry
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Run `snapshot` from its source input through every node in order.
    ///
    /// Disabled nodes pass their input through. The first node that errors,
    /// or whose transform cannot be resolved, stops the run; `final_output`
    /// is then the value that node received.
    pub async fn execute(&self, snapshot: &PipelineModel) -> ExecutionTrace {
        let run_id = Uuid::new_v4();
        let nodes = snapshot.nodes();
        debug!("Starting run {} over {} node(s)", run_id, nodes.len());
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            node_count: nodes.len(),
        })
        .await;

        let mut current = snapshot.input().to_string();
        let mut results = Vec::with_capacity(nodes.len());
        let mut halted_at = None;

        for node in nodes {
            if !node.enabled {
                debug!("Skipping disabled node {}", node.id);
                results.push(NodeResult::skipped(
                    node.id.clone(),
                    node.transform_id.clone(),
                    current.clone(),
                ));
                self.emit_event(ExecutionEvent::NodeSkipped {
                    node_id: node.id.clone(),
                })
                .await;
                continue;
            }

            self.emit_event(ExecutionEvent::NodeStarted {
                node_id: node.id.clone(),
                transform_id: node.transform_id.clone(),
            })
            .await;

            let outcome = match self.registry.lookup(&node.transform_id) {
                Some(transform) => {
                    let options = node.effective_options(&transform.default_options());
                    self.invoke(transform, current.clone(), options).await
                }
                None => Err(TransformError::Unknown),
            };

            match outcome {
                Ok(output) => {
                    debug!("Node {} ({}) succeeded", node.id, node.transform_id);
                    results.push(NodeResult::success(
                        node.id.clone(),
                        node.transform_id.clone(),
                        output.clone(),
                    ));
                    current = output;
                    self.emit_event(ExecutionEvent::NodeSucceeded {
                        node_id: node.id.clone(),
                    })
                    .await;
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!("Node {} ({}) failed: {}", node.id, node.transform_id, error);
                    results.push(NodeResult::error(
                        node.id.clone(),
                        node.transform_id.clone(),
                        error.clone(),
                    ));
                    self.emit_event(ExecutionEvent::NodeFailed {
                        node_id: node.id.clone(),
                        error,
                    })
                    .await;
                    halted_at = Some(node.id.clone());
                    break;
                }
            }
        }

        info!(
            "Run {} finished: {} node result(s){}",
            run_id,
            results.len(),
            if halted_at.is_some() { ", halted on error" } else { "" }
        );
        self.emit_event(ExecutionEvent::RunFinished { run_id, halted_at }).await;

        ExecutionTrace {
            results,
            final_output: current,
        }
    }

    /// Invoke one transform on its own task so a panic is contained.
    ///
    /// The task lives only as long as this future: a timeout, or a caller
    /// dropping the run, aborts it.
    async fn invoke(
        &self,
        transform: Arc<dyn Transform>,
        input: String,
        options: Options,
    ) -> Result<String, TransformError> {
        let mut task = AbortOnDrop(tokio::spawn(async move { transform.run(&input, &options).await }));

        let joined = match self.transform_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
                Ok(joined) => joined,
                Err(_) => return Err(TransformError::Timeout(limit.as_secs())),
            },
            None => (&mut task.0).await,
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(TransformError::Panicked(panic_message(e.into_panic()))),
            Err(e) => Err(TransformError::Internal(e.to_string())),
        }
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
