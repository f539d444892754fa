use serde::Serialize;

use super::BoardContext;
use crate::error::{BoardError, Result};
use crate::format::{OutputMode, format_links};
use crate::model::IssueLink;

#[derive(Debug, Serialize)]
struct LinksResult<'a> {
    id: &'a str,
    key: &'a str,
    links: Vec<IssueLink>,
}

/// Execute the links command.
///
/// # Errors
///
/// Returns `BoardError::IssueNotFound` if `id` is not on the board.
pub fn execute(id: &str, ctx: &BoardContext, mode: OutputMode) -> Result<()> {
    let issue = ctx
        .store
        .get_issue_by_id(id)
        .ok_or_else(|| BoardError::IssueNotFound { id: id.to_string() })?;

    let result = LinksResult {
        id: &issue.id,
        key: &issue.key,
        links: ctx.store.get_issue_links(id),
    };

    mode.emit(&result, || format_links(issue, &result.links))
}
