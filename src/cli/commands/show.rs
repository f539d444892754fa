//! Show command implementation.

use std::str::FromStr;

use super::BoardContext;
use crate::cli::ShowArgs;
use crate::error::{BoardError, Result};
use crate::format::{OutputMode, format_board};
use crate::model::{Board, IssueState};

/// Execute the show command.
///
/// # Errors
///
/// Returns `BoardError::UnknownColumn` for a `--column` that is not
/// configured, or `BoardError::Validation` for an unknown `--state`.
pub fn execute(args: &ShowArgs, ctx: &BoardContext, mode: OutputMode) -> Result<()> {
    let board = ctx.store.get_board();

    let state = args
        .state
        .as_deref()
        .map(IssueState::from_str)
        .transpose()?;

    let mut view = match &args.column {
        Some(name) => {
            let column = board
                .column(name)
                .ok_or_else(|| BoardError::UnknownColumn { name: name.clone() })?;
            Board {
                columns: vec![column.clone()],
            }
        }
        None => board.clone(),
    };

    if state.is_some() || args.label.is_some() {
        view = view.filter(|issue| {
            state.is_none_or(|state| issue.state == state)
                && args
                    .label
                    .as_deref()
                    .is_none_or(|label| issue.has_label(label))
        });
    }

    mode.emit(&view, || format_board(&view))
}
