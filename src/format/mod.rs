//! Output formatting for the `board` binary.
//!
//! Human-readable text goes to stdout; `--json` switches every command to
//! pretty-printed JSON. Quiet mode prints nothing but errors.

mod text;

pub use text::{
    TITLE_WIDTH, format_board, format_column, format_columns, format_issue_line, format_links,
    format_report, format_state_icon, format_update, truncate_title,
};

use serde::Serialize;

use crate::error::Result;

/// How a command should print its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
    Quiet,
}

impl OutputMode {
    /// `--json` takes precedence over `--quiet`.
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Text
        }
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Print `value` as JSON or `text()` as plain text, per mode.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn emit<T, F>(self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        match self {
            Self::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Self::Text => {
                let rendered = text();
                print!("{rendered}");
                if !rendered.is_empty() && !rendered.ends_with('\n') {
                    println!();
                }
            }
            Self::Quiet => {}
        }
        Ok(())
    }
}
