//! Test utility functions for toolpipe scenarios

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolpipe::core::{ExecutionTrace, NodeId, NodeStatus, Options, PipelineModel};
use toolpipe::execution::ExecutionEngine;
use toolpipe::registry::{Transform, TransformError, TransformRegistry};

/// Uppercases its input; inputs starting with "slow" take five seconds
pub struct SlowUpper;

#[async_trait]
impl Transform for SlowUpper {
    fn id(&self) -> &str {
        "slow-upper"
    }

    fn name(&self) -> &str {
        "Slow Uppercase"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        if input.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(input.to_uppercase())
    }
}

/// Always rejects its input
pub struct AlwaysFail;

#[async_trait]
impl Transform for AlwaysFail {
    fn id(&self) -> &str {
        "always-fail"
    }

    fn name(&self) -> &str {
        "Always Fail"
    }

    async fn run(&self, _input: &str, _options: &Options) -> Result<String, TransformError> {
        Err(TransformError::InvalidInput("rejected".to_string()))
    }
}

/// Panics instead of returning
pub struct Panicker;

#[async_trait]
impl Transform for Panicker {
    fn id(&self) -> &str {
        "panicker"
    }

    fn name(&self) -> &str {
        "Panicker"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        panic!("cannot handle {:?}", input);
    }
}

/// Remembers every input it was given and passes it through
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn inputs(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transform for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn name(&self) -> &str {
        "Recorder"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        self.seen.lock().unwrap().push(input.to_string());
        Ok(input.to_string())
    }
}

/// Never finishes; ticks every 100ms while it is alive
#[derive(Clone, Default)]
pub struct Spinner {
    pub ticks: Arc<AtomicUsize>,
}

impl Spinner {
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for Spinner {
    fn id(&self) -> &str {
        "spinner"
    }

    fn name(&self) -> &str {
        "Spinner"
    }

    async fn run(&self, _input: &str, _options: &Options) -> Result<String, TransformError> {
        loop {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Built-in catalog plus the scripted transforms above
pub fn test_registry(recorder: &Recorder) -> Arc<TransformRegistry> {
    test_registry_with(recorder, &Spinner::default())
}

pub fn test_registry_with(recorder: &Recorder, spinner: &Spinner) -> Arc<TransformRegistry> {
    let mut registry = TransformRegistry::with_builtins();
    registry.register(spinner.clone());
    registry.register(SlowUpper);
    registry.register(AlwaysFail);
    registry.register(Panicker);
    registry.register(recorder.clone());
    Arc::new(registry)
}

pub fn test_engine() -> (ExecutionEngine, Recorder) {
    let recorder = Recorder::default();
    let engine = ExecutionEngine::new(test_registry(&recorder));
    (engine, recorder)
}

/// Build a chain of `transform_ids` over `input`
pub fn chain(engine: &ExecutionEngine, input: &str, transform_ids: &[&str]) -> (PipelineModel, Vec<NodeId>) {
    let mut model = PipelineModel::new();
    model.set_input(input);
    let ids = transform_ids
        .iter()
        .map(|id| {
            model
                .add_node(engine.registry(), id, None)
                .unwrap_or_else(|| panic!("unknown transform {}", id))
        })
        .collect();
    (model, ids)
}

pub fn statuses(trace: &ExecutionTrace) -> Vec<NodeStatus> {
    trace.results.iter().map(|r| r.status).collect()
}

pub fn output_of(trace: &ExecutionTrace, index: usize) -> Option<&str> {
    trace.results.get(index).and_then(|r| r.output.as_deref())
}

pub fn assert_halted_at(trace: &ExecutionTrace, index: usize) {
    assert_eq!(
        trace.results.len(),
        index + 1,
        "Expected run to stop at node {}, trace: {:?}",
        index,
        trace
    );
    assert_eq!(
        trace.results[index].status,
        NodeStatus::Error,
        "Expected node {} to error, trace: {:?}",
        index,
        trace
    );
}
