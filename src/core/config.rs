//! Engine configuration from YAML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default debounce window for the reactive scheduler
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Top-level configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long the scheduler waits for changes to settle (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Optional limit on a single transform invocation (seconds)
    #[serde(default)]
    pub transform_timeout_secs: Option<u64>,

    /// Extra directories to load templates from
    #[serde(default)]
    pub template_dirs: Vec<PathBuf>,

    /// Saved-pipeline database location
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            transform_timeout_secs: None,
            template_dirs: Vec::new(),
            database_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transform_timeout_secs == Some(0) {
            anyhow::bail!("transform_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn transform_timeout(&self) -> Option<Duration> {
        self.transform_timeout_secs.map(Duration::from_secs)
    }

    /// Database path, falling back to the user's local data directory
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("toolpipe")
                .join("pipelines.db")
        })
    }
}
