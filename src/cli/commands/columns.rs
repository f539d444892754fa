use serde::Serialize;

use super::BoardContext;
use crate::columns::ColumnDefinition;
use crate::error::Result;
use crate::format::{OutputMode, format_columns};

#[derive(Debug, Serialize)]
struct ColumnSummary<'a> {
    #[serde(flatten)]
    definition: &'a ColumnDefinition,
    issues: usize,
}

/// Execute the columns command.
///
/// # Errors
///
/// Returns an error if JSON output cannot be serialized.
pub fn execute(ctx: &BoardContext, mode: OutputMode) -> Result<()> {
    let columns = ctx.store.columns();
    let board = ctx.store.get_board();

    let summaries: Vec<ColumnSummary<'_>> = columns
        .definitions()
        .iter()
        .map(|definition| ColumnSummary {
            definition,
            issues: board
                .column(&definition.name)
                .map_or(0, |column| column.issues.len()),
        })
        .collect();

    mode.emit(&summaries, || format_columns(columns, board))
}
