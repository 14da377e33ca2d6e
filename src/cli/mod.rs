//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    RunCommand, SaveCommand, SavedCommand, TemplatesCommand, TransformsCommand, ValidateCommand, WatchCommand,
};
use std::ffi::OsString;

/// Chain developer utilities into a pipeline and run text through it
#[derive(Debug, Parser, Clone)]
#[command(name = "toolpipe")]
#[command(author = "Toolpipe Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Chain developer utilities into a transform pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to engine configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline once against an input
    Run(RunCommand),

    /// Re-run a pipeline for every line read from stdin
    Watch(WatchCommand),

    /// Validate a template file
    Validate(ValidateCommand),

    /// List available transforms
    Transforms(TransformsCommand),

    /// List available templates
    Templates(TemplatesCommand),

    /// Save a pipeline under a name
    Save(SaveCommand),

    /// List or delete saved pipelines
    Saved(SavedCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
