//! Templates - named preset chains

use crate::core::node::NodeDescriptor;
use crate::registry::TransformRegistry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::{debug, warn};

/// A named preset chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub nodes: Vec<NodeDescriptor>,
}

impl Template {
    /// Load a template from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid template {}", path.display()))
    }

    /// Parse a template. JSON is accepted too, being valid YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let template: Template = serde_yaml::from_str(yaml)?;
        if template.name.trim().is_empty() {
            anyhow::bail!("Template name must not be empty");
        }
        Ok(template)
    }

    /// Transform ids this template names that the registry cannot resolve
    pub fn unknown_transforms(&self, registry: &TransformRegistry) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|d| !registry.contains(&d.transform_id))
            .map(|d| d.transform_id.clone())
            .collect()
    }
}

/// Collection of templates, built-in presets first
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Library holding only the built-in presets
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Add a template, replacing any existing one with the same name
    pub fn insert(&mut self, template: Template) {
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Load every `*.yaml`, `*.yml` and `*.json` file in `dir`.
    /// Returns how many templates were loaded.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read template directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml") | Some("json")
                )
            })
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match Template::from_file(&path) {
                Ok(template) => {
                    debug!("Loaded template '{}' from {}", template.name, path.display());
                    self.insert(template);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping template {}: {:#}", path.display(), e),
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            name: "base64-roundtrip".to_string(),
            description: Some("Encode to Base64 and decode back".to_string()),
            nodes: vec![
                NodeDescriptor::new("base64-encode"),
                NodeDescriptor::new("base64-decode"),
            ],
        },
        Template {
            name: "pretty-json".to_string(),
            description: Some("Pretty-print JSON with two-space indent".to_string()),
            nodes: vec![NodeDescriptor::new("json-format").with_option("indent", json!(2))],
        },
        Template {
            name: "json-fingerprint".to_string(),
            description: Some("Minify JSON, then hash it".to_string()),
            nodes: vec![NodeDescriptor::new("json-minify"), NodeDescriptor::new("sha256")],
        },
        Template {
            name: "url-token".to_string(),
            description: Some("URL-safe Base64, percent-encoded".to_string()),
            nodes: vec![
                NodeDescriptor::new("base64-encode").with_option("urlSafe", json!(true)),
                NodeDescriptor::new("url-encode"),
            ],
        },
    ]
}
