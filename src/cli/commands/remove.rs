use super::BoardContext;
use crate::error::{BoardError, Result};
use crate::format::OutputMode;

/// Execute the remove command.
///
/// # Errors
///
/// Returns `BoardError::IssueNotFound` if `id` is not on the board, or an
/// error if the dump cannot be written.
pub fn execute(id: &str, ctx: &mut BoardContext, mode: OutputMode) -> Result<()> {
    let issue = ctx
        .store
        .remove_issue_by_id(id)
        .ok_or_else(|| BoardError::IssueNotFound { id: id.to_string() })?;
    ctx.save()?;

    mode.emit(&issue, || format!("Removed {} {}", issue.key, issue.title))
}
