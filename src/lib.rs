//! `issue_board`: an in-memory kanban board over GitHub issues.
//!
//! The [`BoardStore`] keeps a mirror of the issues of one or more
//! repositories, classifies each into a configured column, keeps issue
//! links bidirectional, orders issues within columns with fractional
//! ordinals, and records every mutation in a compacting update log that
//! clients poll with an opaque cursor.
//!
//! Everything that touches the outside world (event sources, dump files,
//! the `board` binary) lives in [`sync`], [`config`] and [`cli`].

pub mod cli;
pub mod columns;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod storage;
pub mod sync;
pub mod util;
pub mod validation;

pub use columns::{ColumnDefinition, Columns};
pub use error::{BoardError, ErrorCode, Result, StructuredError};
pub use model::{Board, Issue, IssueLink, IssuePatch, LinkType, UpdateEntry};
pub use storage::{BoardStore, UpdateLog};
pub use sync::{IssueEvent, IssueSource, SyncReport};
