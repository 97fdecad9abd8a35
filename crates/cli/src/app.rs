//! One pruning run driven by a loaded configuration.

use crate::output;
use anyhow::Result;
use pruner_core::config::AppConfig;
use pruner_core::{prune_with, EntryRemover};
use std::io::{self, Write};

/// Runs the configured prune, writing progress to `out`. Returns the exit code
/// for a run that got started; errors mean it never did.
pub fn execute<R, W>(cfg: &AppConfig, remover: &R, json: bool, out: &mut W) -> Result<u8>
where
    R: EntryRemover + ?Sized,
    W: Write,
{
    let plan = cfg.plan()?;

    let mut write_err: Option<io::Error> = None;
    let report = prune_with(&plan, remover, |event| {
        if json || write_err.is_some() {
            return;
        }
        if let Some(line) = output::render_event(event) {
            if let Err(err) = writeln!(out, "{line}") {
                write_err = Some(err);
            }
        }
    })?;
    if let Some(err) = write_err {
        return Err(err.into());
    }

    if json {
        writeln!(out, "{}", output::render_json(&report)?)?;
    } else {
        for line in output::render_summary(&report, &plan) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(output::exit_code(&report.outcome))
}
