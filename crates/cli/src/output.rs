//! Human-readable and JSON rendering of pruning progress.

use pruner_core::{Outcome, PruneEvent, PrunePlan, PruneReport};
use std::collections::BTreeSet;

/// Exit status when every entry was handled.
pub const EXIT_OK: u8 = 0;
/// Exit status when at least one entry failed.
pub const EXIT_PARTIAL: u8 = 1;
/// Exit status when the run could not start.
pub const EXIT_FAILED: u8 = 2;

pub fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Complete => EXIT_OK,
        Outcome::Partial { .. } | Outcome::Aborted { .. } => EXIT_PARTIAL,
    }
}

/// Progress line for an event, if it has one.
pub fn render_event(event: &PruneEvent<'_>) -> Option<String> {
    match event {
        PruneEvent::RemovingFile(name) => Some(format!("Removing file: {name}")),
        PruneEvent::RemovingDirectory(name) => Some(format!("Removing directory: {name}")),
        PruneEvent::Failed(failure) => Some(format!("Error: {failure}")),
        PruneEvent::Kept { .. } | PruneEvent::Skipped(_) => None,
    }
}

pub fn render_summary(report: &PruneReport, plan: &PrunePlan) -> Vec<String> {
    let status = match &report.outcome {
        Outcome::Complete => "Pruning completed successfully!".to_string(),
        Outcome::Partial { failed } => {
            format!("Pruning completed with {failed} failed entries.")
        }
        Outcome::Aborted { untouched, .. } => {
            format!("Pruning aborted; {untouched} entries left untouched.")
        }
    };
    vec![
        status,
        format!("Kept files: {}", format_names(&plan.keep_files)),
        format!("Kept directories: {}", format_names(&plan.keep_dirs)),
    ]
}

pub fn render_json(report: &PruneReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_json_error(message: &str) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "status": "failed",
        "error": message,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn format_names(names: &BTreeSet<String>) -> String {
    format!("{:?}", names.iter().collect::<Vec<_>>())
}
