//! CLI output formatting

use crate::{
    core::{ExecutionStatus, RunOutcome},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Horizontal rule spanning the terminal width (80 columns if unknown)
pub fn separator() -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80)
        .min(100);
    "─".repeat(width)
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Declined => style("DECLINED").yellow().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Declined => SKIP,
        ExecutionStatus::Running => SPINNER,
        ExecutionStatus::Pending => INFO,
    };

    let halted = summary
        .halted_at
        .as_ref()
        .map(|stage| format!(" at {}", style(stage).cyan()))
        .unwrap_or_default();

    format!(
        "{}{} - {} - {}{} ({}/{}) - {}",
        status_icon,
        style(&summary.execution_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        halted,
        summary.completed_stages,
        summary.total_stages,
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")).dim()
    )
}

/// Indent every line of a block of text
fn indent(text: &str, prefix: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::SequenceStarted {
            execution_id,
            pipeline_name,
            total_stages,
        } => format!(
            "{}Starting {} ({} stages, run {})",
            ROCKET,
            style(pipeline_name).bold(),
            total_stages,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted {
            name, index, total, ..
        } => format!(
            "\n[{}/{}] {}",
            style(index + 1).cyan(),
            style(total).dim(),
            style(name).bold()
        ),
        ExecutionEvent::StageSkipped { stage_id, reason } => {
            format!("{}{} skipped ({})", SKIP, style(stage_id).dim(), reason)
        }
        ExecutionEvent::PreconditionUnmet {
            stage_id,
            condition,
            remediation,
        } => format!(
            "{}{}: requirement not met: {}\n\n{}",
            CROSS,
            style(stage_id).red(),
            condition,
            indent(remediation, "   ")
        ),
        ExecutionEvent::StageDeclined { stage_id } => format!(
            "{}{} skipped at your request",
            SKIP,
            style(stage_id).yellow()
        ),
        ExecutionEvent::StageMessage { lines, .. } => indent(&lines.join("\n"), "   "),
        ExecutionEvent::StageCompleted { stage_id } => {
            format!("{}{}", CHECK, style(stage_id).green())
        }
        ExecutionEvent::StageFailed { stage_id, error } => {
            format!("{}{}: {}", CROSS, style(stage_id).red(), style(error).dim())
        }
        ExecutionEvent::SequenceHalted { outcome, .. } => format_outcome(outcome),
    }
}

/// Final line for a run
pub fn format_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => format!("\n{}Setup {}", CHECK, style("complete").green()),
        RunOutcome::Declined { stage } => format!(
            "\n{}Stopped before {}. Re-run when you are ready to continue.",
            INFO,
            style(stage).cyan()
        ),
        RunOutcome::PreconditionUnmet { stage, .. } => format!(
            "\n{}Setup {}: fix the requirement for {} and re-run",
            CROSS,
            style("halted").red(),
            style(stage).cyan()
        ),
        RunOutcome::ChildFailed { stage, error, .. } => format!(
            "\n{}Setup {} at {}: {}",
            CROSS,
            style("failed").red(),
            style(stage).cyan(),
            error
        ),
        RunOutcome::Aborted { stage, error } => format!(
            "\n{}Setup {} at {}: {}",
            CROSS,
            style("aborted").red(),
            style(stage).cyan(),
            error
        ),
    }
}
