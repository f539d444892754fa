//! Ingest command: apply a JSONL event file to the board.

use serde::Serialize;
use std::fmt::Write as FmtWrite;
use tracing::info;

use super::BoardContext;
use crate::cli::IngestArgs;
use crate::error::Result;
use crate::format::{OutputMode, format_report, format_update};
use crate::model::UpdateEntry;
use crate::sync::{EventErrorPolicy, JsonlEventSource, SyncReport, sync_from};

#[derive(Debug, Serialize)]
struct IngestResult {
    report: SyncReport,
    /// Entries produced by this run, oldest first.
    updates: Vec<UpdateEntry>,
    cursor: String,
}

/// Execute the ingest command.
///
/// The dump is only rewritten when the whole file was processed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if `--strict`
/// is set and an event fails, or if the dump cannot be written.
pub fn execute(args: &IngestArgs, ctx: &mut BoardContext, mode: OutputMode) -> Result<()> {
    let policy = if args.strict {
        EventErrorPolicy::Strict
    } else {
        EventErrorPolicy::BestEffort
    };

    let cursor = ctx.store.update_head().to_string();
    let mut source = JsonlEventSource::new(&args.file);
    let report = sync_from(&mut source, &mut ctx.store, policy)?;
    ctx.save()?;

    info!(file = %args.file.display(), %policy, summary = %report.summary(), "Ingested events");

    let result = IngestResult {
        report,
        updates: ctx.store.get_updates(Some(&cursor)),
        cursor: ctx.store.update_head().to_string(),
    };

    mode.emit(&result, || {
        let mut out = format_report(&result.report);
        for entry in &result.updates {
            let _ = writeln!(out, "  {}", format_update(entry));
        }
        out
    })
}
