use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use toolpipe::cli::commands::{
    PipelineSource, RunCommand, SaveCommand, SavedCommand, TemplatesCommand, TransformsCommand, ValidateCommand,
    WatchCommand,
};
use toolpipe::cli::output::*;
use toolpipe::cli::{Cli, Command};
use toolpipe::core::{EngineConfig, PipelineModel, Template, TemplateLibrary};
use toolpipe::execution::{ExecutionEngine, PipelineSession};
use toolpipe::persistence::{PipelineStore, SavedPipeline};
use toolpipe::registry::TransformRegistry;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Everything a command needs, built once from the config
struct AppContext {
    config: EngineConfig,
    registry: Arc<TransformRegistry>,
    library: TemplateLibrary,
}

impl AppContext {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => EngineConfig::from_file(path).context("Failed to load engine config")?,
            None => EngineConfig::default(),
        };

        let mut library = TemplateLibrary::builtin();
        for dir in &config.template_dirs {
            let loaded = library.load_dir(dir)?;
            debug!("Loaded {} template(s) from {}", loaded, dir.display());
        }

        Ok(Self {
            config,
            registry: Arc::new(TransformRegistry::with_builtins()),
            library,
        })
    }

    fn engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(self.registry.clone()).with_transform_timeout(self.config.transform_timeout())
    }

    /// A template by library name, or else by file path
    fn template(&self, name_or_path: &str) -> Result<Template> {
        if let Some(template) = self.library.get(name_or_path) {
            return Ok(template.clone());
        }
        if Path::new(name_or_path).exists() {
            return Template::from_file(name_or_path);
        }
        anyhow::bail!("No template named '{}' and no such file", name_or_path)
    }

    async fn store(&self) -> Result<Arc<dyn PipelineStore>> {
        #[cfg(feature = "sqlite")]
        {
            let store = toolpipe::persistence::SqlitePipelineStore::new(self.config.database_path()).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        {
            warn!("Built without sqlite support; saved pipelines last only for this process");
            Ok(Arc::new(toolpipe::persistence::InMemoryPipelineStore::new()))
        }
    }

    async fn model(&self, source: &PipelineSource) -> Result<PipelineModel> {
        if let Some(name) = &source.template {
            let template = self.template(name)?;
            let unknown = template.unknown_transforms(&self.registry);
            if !unknown.is_empty() {
                warn!("Template '{}' drops unknown transforms: {}", template.name, unknown.join(", "));
            }
            let mut model = PipelineModel::new();
            model.load_template(&self.registry, &template.nodes);
            return Ok(model);
        }

        if let Some(name) = &source.saved {
            let saved = self
                .store()
                .await?
                .load(name)
                .await?
                .with_context(|| format!("No saved pipeline named '{}'", name))?;
            return Ok(PipelineModel::from_serialized(saved.pipeline)?);
        }

        if let Some(path) = &source.pipeline {
            let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            return Ok(PipelineModel::from_json(&json)?);
        }

        anyhow::bail!("No pipeline source given")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let ctx = AppContext::load(&cli)?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(&ctx, cmd).await?,
        Command::Watch(cmd) => watch_pipeline(&ctx, cmd).await?,
        Command::Validate(cmd) => validate_template(&ctx, cmd)?,
        Command::Transforms(cmd) => list_transforms(&ctx, cmd)?,
        Command::Templates(cmd) => list_templates(&ctx, cmd)?,
        Command::Save(cmd) => save_pipeline(&ctx, cmd).await?,
        Command::Saved(cmd) => show_saved(&ctx, cmd).await?,
    }

    Ok(())
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read stdin")?;
    Ok(input)
}

async fn run_pipeline(ctx: &AppContext, cmd: &RunCommand) -> Result<()> {
    let mut model = ctx.model(&cmd.source).await?;

    if let Some(input) = &cmd.input {
        model.set_input(input.clone());
    } else if let Some(path) = &cmd.input_file {
        let input = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        model.set_input(input);
    } else if cmd.source.template.is_some() {
        model.set_input(read_stdin().await?);
    }

    for &index in &cmd.disable {
        let Some(node) = model.nodes().get(index) else {
            warn!("No node at position {}; nothing to disable", index);
            continue;
        };
        if node.enabled {
            let id = node.id.clone();
            model.toggle_node(&id);
        }
    }

    let engine = ctx.engine();
    engine
        .add_event_handler(|event| debug!("{}", format_execution_event(&event)))
        .await;

    let trace = engine.execute(&model).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else {
        println!("{}", format_trace(&model, &trace));
    }

    if !trace.is_complete() {
        std::process::exit(1);
    }

    Ok(())
}

async fn watch_pipeline(ctx: &AppContext, cmd: &WatchCommand) -> Result<()> {
    let model = ctx.model(&cmd.source).await?;
    let chain = model.clone();
    let session = PipelineSession::with_model(Arc::new(ctx.engine()), model, ctx.config.debounce());
    let mut rx = session.subscribe()?;

    let json = cmd.json;
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let Some(published) = rx.borrow_and_update().clone() else {
                continue;
            };
            if json {
                match serde_json::to_string(&published.trace) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to encode trace: {}", e),
                }
            } else {
                println!("{}", format_trace(&chain, &published.trace));
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        session.set_input(line).await?;
    }

    session.flush().await?;
    session.teardown().await;
    drop(session);
    printer.await.context("Trace printer failed")?;

    Ok(())
}

fn validate_template(ctx: &AppContext, cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating template...", INFO);

    let template = match Template::from_file(&cmd.file) {
        Ok(template) => template,
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    };

    let unknown = template.unknown_transforms(&ctx.registry);

    if cmd.json {
        let data = serde_json::json!({
            "template": template,
            "unknownTransforms": unknown,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("  Name: {}", style(&template.name).bold());
        println!("  Nodes: {}", style(template.nodes.len()).cyan());
        for id in &unknown {
            println!("{} Unknown transform '{}' will be dropped", WARN, style(id).yellow());
        }
    }

    if !unknown.is_empty() {
        std::process::exit(1);
    }
    println!("{} Template is valid!", CHECK);
    Ok(())
}

fn list_transforms(ctx: &AppContext, cmd: &TransformsCommand) -> Result<()> {
    if cmd.json {
        let data: Vec<_> = ctx
            .registry
            .list()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id(),
                    "name": t.name(),
                    "defaultOptions": t.default_options(),
                    "optionSchema": t.option_schema(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Available transforms:", INFO);
    for transform in ctx.registry.list() {
        println!("{}", format_transform(transform.as_ref()));
    }
    Ok(())
}

fn list_templates(ctx: &AppContext, cmd: &TemplatesCommand) -> Result<()> {
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(ctx.library.list())?);
        return Ok(());
    }

    println!("{} Available templates:", INFO);
    for template in ctx.library.list() {
        println!("{}", format_template(template));
    }
    Ok(())
}

async fn save_pipeline(ctx: &AppContext, cmd: &SaveCommand) -> Result<()> {
    let template = ctx.template(&cmd.template)?;
    let mut model = PipelineModel::new();
    model.load_template(&ctx.registry, &template.nodes);
    model.set_input(cmd.input.clone());

    let store = ctx.store().await?;
    store.save(&SavedPipeline::new(&cmd.name, &model)).await?;

    println!(
        "{} Saved {} ({} nodes)",
        CHECK,
        style(&cmd.name).bold(),
        style(model.len()).cyan()
    );
    Ok(())
}

async fn show_saved(ctx: &AppContext, cmd: &SavedCommand) -> Result<()> {
    let store = ctx.store().await?;

    if let Some(name) = &cmd.delete {
        if store.delete(name).await? {
            println!("{} Deleted {}", CHECK, style(name).bold());
        } else {
            println!("{} No saved pipeline named {}", WARN, style(name).bold());
        }
        return Ok(());
    }

    let saved = store.list().await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
        return Ok(());
    }

    if saved.is_empty() {
        println!("{} No saved pipelines", INFO);
        return Ok(());
    }

    println!("{} Saved pipelines:", INFO);
    for pipeline in &saved {
        println!("{}", format_saved(pipeline));
    }
    Ok(())
}
