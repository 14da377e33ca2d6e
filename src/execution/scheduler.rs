//! Reactive scheduler - decides when to re-run the chain
//!
//! Every change notification bumps a generation counter and arms a debounce
//! timer. When a timer fires it only runs if no newer notification arrived,
//! and a finished run only publishes if its generation is still the latest.
//! Consumers therefore never see an older trace replace a newer one.
//! A newer notification also aborts the task of the one it supersedes.

use crate::{
    core::{ExecutionTrace, PipelineModel},
    execution::ExecutionEngine,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors raised by scheduler and session operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("pipeline session has been torn down")]
    TornDown,
}

/// A trace together with the change generation it reflects
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedTrace {
    pub generation: u64,
    pub trace: ExecutionTrace,
}

struct Shared {
    engine: Arc<ExecutionEngine>,
    model: Arc<RwLock<PipelineModel>>,
    debounce: Duration,
    generation: AtomicU64,
    torn_down: AtomicBool,
    /// Serializes the stale check with publishing and teardown
    publish_lock: Mutex<()>,
    publisher: watch::Sender<Option<PublishedTrace>>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        !self.torn_down.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(&self, generation: u64) -> Option<PublishedTrace> {
        // Copy-on-read: later edits must not leak into this run
        let snapshot = self.model.read().await.clone();
        let trace = self.engine.execute(&snapshot).await;
        self.publish(generation, trace).await
    }

    async fn publish(&self, generation: u64, trace: ExecutionTrace) -> Option<PublishedTrace> {
        let _guard = self.publish_lock.lock().await;
        if !self.is_current(generation) {
            debug!("Discarding stale trace for generation {}", generation);
            return None;
        }

        let published = PublishedTrace { generation, trace };
        self.publisher.send_replace(Some(published.clone()));
        debug!("Published trace for generation {}", generation);
        Some(published)
    }
}

/// Debounced, last-write-wins re-execution of a shared model
pub struct ReactiveScheduler {
    shared: Arc<Shared>,
    pending: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ReactiveScheduler {
    pub fn new(engine: Arc<ExecutionEngine>, model: Arc<RwLock<PipelineModel>>, debounce: Duration) -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                engine,
                model,
                debounce,
                generation: AtomicU64::new(0),
                torn_down: AtomicBool::new(false),
                publish_lock: Mutex::new(()),
                publisher,
            }),
            pending: std::sync::Mutex::new(None),
        }
    }

    /// Receive every published trace. Starts at `None` until the first run.
    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedTrace>> {
        self.shared.publisher.subscribe()
    }

    /// Most recently published trace
    pub fn latest(&self) -> Option<PublishedTrace> {
        self.shared.publisher.borrow().clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.load(Ordering::SeqCst)
    }

    /// Record that the model changed and schedule a debounced run.
    ///
    /// Returns the generation this change was assigned. Must be called from
    /// within a tokio runtime.
    pub fn notify_changed(&self) -> Result<u64, SchedulerError> {
        if self.is_torn_down() {
            return Err(SchedulerError::TornDown);
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            if !shared.is_current(generation) {
                debug!("Generation {} superseded during debounce", generation);
                return;
            }
            shared.run(generation).await;
        });

        // A superseded task could only produce a stale trace
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            previous.abort();
        }

        Ok(generation)
    }

    /// Run immediately with the latest model, superseding any pending
    /// debounce. Returns the trace if it was published.
    pub async fn flush(&self) -> Result<Option<PublishedTrace>, SchedulerError> {
        if self.is_torn_down() {
            return Err(SchedulerError::TornDown);
        }
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.shared.run(generation).await)
    }

    /// Stop publishing for good: the pending timer or run is cancelled,
    /// together with any transform it was awaiting.
    pub async fn teardown(&self) {
        {
            let _guard = self.shared.publish_lock.lock().await;
            self.shared.torn_down.store(true, Ordering::SeqCst);
        }
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        info!("Scheduler torn down");
    }
}

impl Drop for ReactiveScheduler {
    fn drop(&mut self) {
        self.shared.torn_down.store(true, Ordering::SeqCst);
        if let Some(handle) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
