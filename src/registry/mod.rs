//! Transform registry - the catalog of transforms a pipeline can use

pub mod builtin;
pub mod error;
pub mod schema;

use crate::core::Options;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use error::TransformError;
pub use schema::{check_options, OptionKind, OptionSpec};

/// A pure `(input, options) -> output` function identified by a stable id
///
/// Implementations may be synchronous or move work elsewhere; the engine
/// always awaits `run`.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Unique registry key
    fn id(&self) -> &str;

    /// Display label
    fn name(&self) -> &str;

    /// Values used for any option a node does not set
    fn default_options(&self) -> Options {
        Options::new()
    }

    /// Option definitions used to render and validate configuration
    fn option_schema(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Transform `input`
    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError>;
}

/// Lookup table from transform id to implementation
#[derive(Clone, Default)]
pub struct TransformRegistry {
    entries: Vec<Arc<dyn Transform>>,
    index: HashMap<String, usize>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register a transform. An existing entry with the same id is replaced
    /// in place, keeping its position in `list()`.
    pub fn register<T: Transform + 'static>(&mut self, transform: T) {
        self.register_arc(Arc::new(transform));
    }

    pub fn register_arc(&mut self, transform: Arc<dyn Transform>) {
        let id = transform.id().to_string();
        match self.index.get(&id) {
            Some(&position) => self.entries[position] = transform,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push(transform);
            }
        }
    }

    /// Resolve a transform id
    pub fn lookup(&self, transform_id: &str) -> Option<Arc<dyn Transform>> {
        self.index
            .get(transform_id)
            .map(|&position| self.entries[position].clone())
    }

    pub fn contains(&self, transform_id: &str) -> bool {
        self.index.contains_key(transform_id)
    }

    /// All transforms, in registration order
    pub fn list(&self) -> &[Arc<dyn Transform>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.entries.iter().map(|t| t.id()).collect::<Vec<_>>())
            .finish()
    }
}
