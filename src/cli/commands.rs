//! CLI command definitions

use clap::Args;

/// Where a pipeline definition comes from
#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct PipelineSource {
    /// Template name (built-in or from a template dir) or template file path
    #[arg(short, long)]
    pub template: Option<String>,

    /// Name of a saved pipeline
    #[arg(long)]
    pub saved: Option<String>,

    /// Path to a serialized pipeline (JSON)
    #[arg(long)]
    pub pipeline: Option<String>,
}

/// Run a pipeline once
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Input text (overrides any saved input)
    #[arg(short, long, conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read input from a file
    #[arg(long)]
    pub input_file: Option<String>,

    /// Skip the node at this position (0-based); may be repeated
    #[arg(long)]
    pub disable: Vec<usize>,

    /// Print the trace as JSON
    #[arg(long)]
    pub json: bool,
}

/// Re-run a pipeline for every stdin line
#[derive(Debug, Args, Clone)]
pub struct WatchCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Print traces as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Validate a template file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to template YAML/JSON file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List transforms
#[derive(Debug, Args, Clone)]
pub struct TransformsCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List templates
#[derive(Debug, Args, Clone)]
pub struct TemplatesCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Save a pipeline
#[derive(Debug, Args, Clone)]
pub struct SaveCommand {
    /// Name to save under
    #[arg(short, long)]
    pub name: String,

    /// Template name or file to build the chain from
    #[arg(short, long)]
    pub template: String,

    /// Source input to store with the chain
    #[arg(short, long, default_value = "")]
    pub input: String,
}

/// List or delete saved pipelines
#[derive(Debug, Args, Clone)]
pub struct SavedCommand {
    /// Delete the saved pipeline with this name
    #[arg(long)]
    pub delete: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
