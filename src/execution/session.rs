//! Pipeline session - the controller that owns a model and keeps its trace fresh

use crate::{
    core::{NodeId, Options, PipelineModel, Template},
    execution::{ExecutionEngine, PublishedTrace, ReactiveScheduler, SchedulerError},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Owns a [`PipelineModel`], applies edits to it, and re-runs it through
/// the scheduler whenever an edit actually changes something.
///
/// After [`teardown`](Self::teardown) every operation fails with
/// [`SchedulerError::TornDown`].
pub struct PipelineSession {
    engine: Arc<ExecutionEngine>,
    model: Arc<RwLock<PipelineModel>>,
    scheduler: ReactiveScheduler,
}

impl PipelineSession {
    pub fn new(engine: Arc<ExecutionEngine>, debounce: Duration) -> Self {
        Self::with_model(engine, PipelineModel::new(), debounce)
    }

    pub fn with_model(engine: Arc<ExecutionEngine>, model: PipelineModel, debounce: Duration) -> Self {
        let model = Arc::new(RwLock::new(model));
        let scheduler = ReactiveScheduler::new(engine.clone(), model.clone(), debounce);
        Self {
            engine,
            model,
            scheduler,
        }
    }

    fn ensure_live(&self) -> Result<(), SchedulerError> {
        if self.scheduler.is_torn_down() {
            Err(SchedulerError::TornDown)
        } else {
            Ok(())
        }
    }

    fn changed(&self, changed: bool) -> Result<(), SchedulerError> {
        if changed {
            self.scheduler.notify_changed()?;
        }
        Ok(())
    }

    pub async fn set_input(&self, text: impl Into<String>) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        self.model.write().await.set_input(text);
        self.changed(true)
    }

    /// Append a node. `Ok(None)` means the transform id is unknown and
    /// nothing changed.
    pub async fn add_node(
        &self,
        transform_id: &str,
        options: Option<Options>,
    ) -> Result<Option<NodeId>, SchedulerError> {
        self.ensure_live()?;
        let id = self
            .model
            .write()
            .await
            .add_node(self.engine.registry(), transform_id, options);
        self.changed(id.is_some())?;
        Ok(id)
    }

    pub async fn remove_node(&self, node_id: &NodeId) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        let changed = self.model.write().await.remove_node(node_id);
        self.changed(changed)
    }

    pub async fn move_node(&self, node_id: &NodeId, new_index: usize) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        let changed = self.model.write().await.move_node(node_id, new_index);
        self.changed(changed)
    }

    pub async fn update_node_options(&self, node_id: &NodeId, partial: &Options) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        let changed = self.model.write().await.update_node_options(node_id, partial);
        self.changed(changed)
    }

    pub async fn toggle_node(&self, node_id: &NodeId) -> Result<Option<bool>, SchedulerError> {
        self.ensure_live()?;
        let enabled = self.model.write().await.toggle_node(node_id);
        self.changed(enabled.is_some())?;
        Ok(enabled)
    }

    /// Replace the chain with a template's nodes
    pub async fn load_template(&self, template: &Template) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        self.model
            .write()
            .await
            .load_template(self.engine.registry(), &template.nodes);
        self.changed(true)
    }

    /// Copy of the current model
    pub async fn snapshot(&self) -> Result<PipelineModel, SchedulerError> {
        self.ensure_live()?;
        Ok(self.model.read().await.clone())
    }

    pub fn subscribe(&self) -> Result<watch::Receiver<Option<PublishedTrace>>, SchedulerError> {
        self.ensure_live()?;
        Ok(self.scheduler.subscribe())
    }

    pub fn latest(&self) -> Option<PublishedTrace> {
        self.scheduler.latest()
    }

    /// Run now instead of waiting for the debounce window
    pub async fn flush(&self) -> Result<Option<PublishedTrace>, SchedulerError> {
        self.scheduler.flush().await
    }

    pub async fn teardown(&self) {
        self.scheduler.teardown().await;
    }
}
