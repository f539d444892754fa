//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Kanban board over GitHub issues, driven from event files
#[derive(Parser, Debug)]
#[command(name = "board", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Board directory (auto-discover .board/ if not set)
    #[arg(long, global = true, env = "BOARD_DIR")]
    pub dir: Option<PathBuf>,

    /// Dump file path (default: .board/board.json)
    #[arg(long, global = true)]
    pub dump: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a board directory
    Init,

    /// List configured columns with issue counts
    Columns,

    /// Apply a JSONL file of issue events
    Ingest(IngestArgs),

    /// Show the board grouped by column
    Show(ShowArgs),

    /// Show the links of one issue
    Links {
        /// Issue ID
        id: String,
    },

    /// Move an issue to a column position
    Move(MoveArgs),

    /// Remove an issue from the board
    #[command(alias = "rm")]
    Remove {
        /// Issue ID
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Event file, one JSON event per line
    pub file: PathBuf,

    /// Abort on the first failing event (nothing is saved)
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Only this column
    #[arg(long)]
    pub column: Option<String>,

    /// Only issues in this state (open, closed)
    #[arg(long)]
    pub state: Option<String>,

    /// Only issues carrying this label
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    /// Issue ID
    pub id: String,

    /// Target column
    #[arg(long)]
    pub column: String,

    /// Issue that should follow the moved one
    #[arg(long)]
    pub before: Option<String>,

    /// Issue that should precede the moved one
    #[arg(long)]
    pub after: Option<String>,
}
