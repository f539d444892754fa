//! Plain-text renderers for boards, columns, links and reports.

use std::fmt::Write as FmtWrite;

use crate::columns::Columns;
use crate::model::{Board, BoardColumn, Issue, IssueLink, IssueState, UpdateEntry, UpdatePayload};
use crate::sync::SyncReport;

/// Widest title shown on a single board line.
pub const TITLE_WIDTH: usize = 60;

/// Truncate a title to `max_len` characters, ending with `...` when cut.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title.to_string();
    }
    if max_len <= 3 {
        return title.chars().take(max_len).collect();
    }
    let mut out: String = title.chars().take(max_len - 3).collect();
    out.push_str("...");
    out
}

#[must_use]
pub const fn format_state_icon(state: IssueState) -> &'static str {
    match state {
        IssueState::Open => "[ ]",
        IssueState::Closed => "[x]",
    }
}

/// `[ ] owner/repo#1 Title (label, label)`
#[must_use]
pub fn format_issue_line(issue: &Issue) -> String {
    let mut line = format!(
        "{} {} {}",
        format_state_icon(issue.state),
        issue.key,
        truncate_title(&issue.title, TITLE_WIDTH)
    );
    let labels: Vec<&str> = issue
        .labels
        .iter()
        .filter(|label| !label.column_label)
        .map(|label| label.name.as_str())
        .collect();
    if !labels.is_empty() {
        let _ = write!(line, " ({})", labels.join(", "));
    }
    line
}

#[must_use]
pub fn format_column(column: &BoardColumn) -> String {
    let mut out = format!("{} ({})\n", column.name, column.issues.len());
    for entry in &column.issues {
        let _ = write!(out, "  {}", format_issue_line(&entry.issue));
        if !entry.links.is_empty() {
            let _ = write!(out, "  [{} linked]", entry.links.len());
        }
        out.push('\n');
    }
    out
}

/// Render every column, separated by blank lines.
#[must_use]
pub fn format_board(board: &Board) -> String {
    board
        .columns
        .iter()
        .map(format_column)
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn format_columns(columns: &Columns, board: &Board) -> String {
    let mut out = String::new();
    for definition in columns.definitions() {
        let count = board
            .column(&definition.name)
            .map_or(0, |column| column.issues.len());
        let mut flags = Vec::new();
        if let Some(label) = &definition.label {
            flags.push(format!("label={label}"));
        }
        if definition.closed {
            flags.push("closed".to_string());
        }
        if definition.sorting {
            flags.push("sorting".to_string());
        }
        if definition.default {
            flags.push("default".to_string());
        }
        let _ = write!(out, "{:<16} {:>4}", definition.name, count);
        if !flags.is_empty() {
            let _ = write!(out, "  {}", flags.join(" "));
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn format_links(issue: &Issue, links: &[IssueLink]) -> String {
    let mut out = format!("{}\n", format_issue_line(issue));
    if links.is_empty() {
        out.push_str("  (no links)\n");
        return out;
    }
    for link in links {
        let _ = writeln!(
            out,
            "  {:<12} {} {}",
            link.link_type.as_str(),
            link.target.key,
            truncate_title(&link.target.title, TITLE_WIDTH)
        );
    }
    out
}

#[must_use]
pub fn format_update(entry: &UpdateEntry) -> String {
    match &entry.issue {
        UpdatePayload::Issue(board_issue) => format!(
            "{} update {} -> {} @ {}",
            entry.id, board_issue.issue.key, board_issue.issue.column, board_issue.issue.order
        ),
        UpdatePayload::Removed(removed) => format!("{} remove {}", entry.id, removed.key),
    }
}

#[must_use]
pub fn format_report(report: &SyncReport) -> String {
    let mut out = format!("Ingested events: {}\n", report.summary());
    for error in &report.errors {
        let _ = writeln!(out, "  failed {}", error.summary());
    }
    out
}
