//! Move command: pin an issue to a column position.

use super::BoardContext;
use crate::cli::MoveArgs;
use crate::error::Result;
use crate::format::{OutputMode, format_issue_line};

/// Execute the move command.
///
/// # Errors
///
/// Returns `BoardError::IssueNotFound` for an unknown id,
/// `BoardError::UnknownColumn` for an unconfigured column, or an error
/// if the dump cannot be written.
pub fn execute(args: &MoveArgs, ctx: &mut BoardContext, mode: OutputMode) -> Result<()> {
    let issue = ctx.store.move_issue(
        &args.id,
        &args.column,
        args.before.as_deref(),
        args.after.as_deref(),
    )?;
    ctx.save()?;

    mode.emit(&issue, || {
        format!(
            "Moved {} to {} (order {})",
            format_issue_line(&issue),
            issue.column,
            issue.order
        )
    })
}
