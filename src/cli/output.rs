//! CLI output formatting

use crate::{
    core::{ExecutionTrace, NodeResult, NodeStatus, PipelineModel, Template},
    execution::ExecutionEvent,
    persistence::SavedPipeline,
    registry::{OptionKind, Transform},
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Horizontal rule across the terminal
pub fn separator() -> String {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
    "─".repeat(width.min(120))
}

/// Format a node status for display
pub fn format_node_status(status: NodeStatus) -> String {
    match status {
        NodeStatus::Success => style("SUCCESS").green().to_string(),
        NodeStatus::Error => style("ERROR").red().to_string(),
        NodeStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Shorten long output for one-line display
pub fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', "⏎");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

/// Format one node result line
pub fn format_node_result(index: usize, result: &NodeResult) -> String {
    let icon = match result.status {
        NodeStatus::Success => CHECK,
        NodeStatus::Error => CROSS,
        NodeStatus::Skipped => SKIP,
    };
    let detail = match (&result.output, &result.error) {
        (_, Some(error)) => style(error.clone()).red().to_string(),
        (Some(output), None) => style(preview(output, 60)).dim().to_string(),
        (None, None) => String::new(),
    };
    format!(
        "{}[{}] {} {} {}",
        icon,
        index,
        style(&result.transform_id).cyan(),
        format_node_status(result.status),
        detail
    )
}

/// Format a whole trace, nodes that never ran included
pub fn format_trace(model: &PipelineModel, trace: &ExecutionTrace) -> String {
    let mut lines = Vec::new();
    for (index, node) in model.nodes().iter().enumerate() {
        match trace.result_for(&node.id) {
            Some(result) => lines.push(format_node_result(index, result)),
            None => lines.push(format!(
                "  [{}] {} {}",
                index,
                style(&node.transform_id).cyan(),
                style("NOT RUN").dim()
            )),
        }
    }
    lines.push(separator());
    lines.push(trace.final_output.clone());
    lines.join("\n")
}

/// Format an execution event for verbose progress output
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted { run_id, node_count } => format!(
            "run {} started ({} nodes)",
            &run_id.to_string()[..8],
            node_count
        ),
        ExecutionEvent::NodeStarted { node_id, transform_id } => {
            format!("node {} ({}) started", node_id, transform_id)
        }
        ExecutionEvent::NodeSucceeded { node_id } => format!("node {} succeeded", node_id),
        ExecutionEvent::NodeSkipped { node_id } => format!("node {} skipped", node_id),
        ExecutionEvent::NodeFailed { node_id, error } => format!("node {} failed: {}", node_id, error),
        ExecutionEvent::RunFinished { run_id, halted_at } => match halted_at {
            Some(node_id) => format!("run {} halted at {}", &run_id.to_string()[..8], node_id),
            None => format!("run {} finished", &run_id.to_string()[..8]),
        },
    }
}

fn format_option_kind(kind: &OptionKind) -> String {
    match kind {
        OptionKind::Boolean => "boolean".to_string(),
        OptionKind::Integer { min, max } => format!("integer {}..={}", min, max),
        OptionKind::Text => "text".to_string(),
        OptionKind::Choice { choices } => format!("one of {}", choices.join("|")),
    }
}

/// Format a transform and its options
pub fn format_transform(transform: &dyn Transform) -> String {
    let mut out = format!("  {} - {}", style(transform.id()).bold(), transform.name());
    let defaults = transform.default_options();
    for spec in transform.option_schema() {
        let default = defaults
            .get(&spec.key)
            .map(|v| format!(" (default {})", v))
            .unwrap_or_default();
        out.push_str(&format!(
            "\n      {}: {}{}",
            style(&spec.key).cyan(),
            format_option_kind(&spec.kind),
            style(default).dim()
        ));
    }
    out
}

pub fn format_template(template: &Template) -> String {
    let chain: Vec<&str> = template.nodes.iter().map(|n| n.transform_id.as_str()).collect();
    format!(
        "  {} - {}\n      {}",
        style(&template.name).bold(),
        template.description.as_deref().unwrap_or(""),
        style(chain.join(" → ")).dim()
    )
}

pub fn format_saved(saved: &SavedPipeline) -> String {
    format!(
        "  {} ({} nodes) - saved {}",
        style(&saved.name).bold(),
        style(saved.pipeline.nodes.len()).cyan(),
        style(saved.saved_at.format("%Y-%m-%d %H:%M:%S")).dim()
    )
}
