//! Persistence layer for saved pipelines

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqlitePipelineStore;

use crate::core::{PipelineModel, SerializedPipeline};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pipeline saved under a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPipeline {
    /// Unique name
    pub name: String,

    /// Chain and input, in serialized form
    pub pipeline: SerializedPipeline,

    /// When it was last saved
    pub saved_at: DateTime<Utc>,
}

impl SavedPipeline {
    pub fn new(name: impl Into<String>, model: &PipelineModel) -> Self {
        Self {
            name: name.into(),
            pipeline: model.serialize(),
            saved_at: Utc::now(),
        }
    }
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PipelineStore: Send + Sync {
    /// Save a pipeline, replacing any pipeline with the same name
    async fn save(&self, pipeline: &SavedPipeline) -> Result<()>;

    /// Load a pipeline by name
    async fn load(&self, name: &str) -> Result<Option<SavedPipeline>>;

    /// List all saved pipelines, ordered by name
    async fn list(&self) -> Result<Vec<SavedPipeline>>;

    /// Delete a pipeline. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPipelineStore {
    pipelines: tokio::sync::RwLock<BTreeMap<String, SavedPipeline>>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self {
            pipelines: tokio::sync::RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryPipelineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PipelineStore for InMemoryPipelineStore {
    async fn save(&self, pipeline: &SavedPipeline) -> Result<()> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.name.clone(), pipeline.clone());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<SavedPipeline>> {
        Ok(self.pipelines.read().await.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<SavedPipeline>> {
        Ok(self.pipelines.read().await.values().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.pipelines.write().await.remove(name).is_some())
    }
}
