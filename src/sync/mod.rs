//! Adapters between the board store and the outside world.
//!
//! - `IssueSource`: anything that hands the store normalized issue events
//!   (webhook queue, periodic API sync, a JSONL file)
//! - `apply_events`: drive a store from a batch of events
//! - `dump_to_file` / `restore_from_file`: persistence hooks
//!
//! The store itself never performs I/O; everything here wraps it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{BoardError, Result, io_context};
use crate::model::{Issue, IssuePatch};
use crate::storage::BoardStore;

/// A normalized inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IssueEvent {
    /// Issue created or changed upstream.
    Update {
        issue: IssuePatch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order: Option<f64>,
    },
    /// Caller-driven move to a column position.
    Move {
        issue: IssuePatch,
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<String>,
    },
    /// Issue deleted or transferred away.
    Remove { id: String },
}

impl IssueEvent {
    /// Id of the issue the event concerns, when known.
    #[must_use]
    pub fn issue_id(&self) -> Option<&str> {
        match self {
            Self::Update { issue, .. } | Self::Move { issue, .. } => issue.id.as_deref(),
            Self::Remove { id } => Some(id),
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::Update {
                issue,
                column,
                order,
            } => Self::Update {
                issue: issue.with_derived_identity(),
                column,
                order,
            },
            Self::Move {
                issue,
                column,
                before,
                after,
            } => Self::Move {
                issue: issue.with_derived_identity(),
                column,
                before,
                after,
            },
            remove @ Self::Remove { .. } => remove,
        }
    }
}

/// Supplies batches of events to apply.
pub trait IssueSource {
    /// Fetch the events available since the previous call.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream cannot be read or parsed.
    fn fetch_events(&mut self) -> Result<Vec<IssueEvent>>;
}

impl IssueSource for Vec<IssueEvent> {
    fn fetch_events(&mut self) -> Result<Vec<IssueEvent>> {
        Ok(std::mem::take(self))
    }
}

/// Reads one JSON event per line from a file. The file is consumed once.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    path: PathBuf,
    consumed: bool,
}

impl JsonlEventSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consumed: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IssueSource for JsonlEventSource {
    fn fetch_events(&mut self) -> Result<Vec<IssueEvent>> {
        if self.consumed {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|e| io_context("open event file", &self.path, e))?;
        let events = read_events(BufReader::new(file))?;
        self.consumed = true;
        debug!(path = %self.path.display(), count = events.len(), "Read events");
        Ok(events)
    }
}

/// Parse JSONL events, skipping blank lines.
///
/// # Errors
///
/// Returns `BoardError::EventParse` with the 1-based line number of the
/// first malformed line.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<IssueEvent>> {
    let mut events = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: IssueEvent = serde_json::from_str(&line).map_err(|e| BoardError::EventParse {
            line: line_num + 1,
            reason: e.to_string(),
        })?;
        events.push(event.normalized());
    }

    Ok(events)
}

/// How `apply_events` reacts to a failing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventErrorPolicy {
    /// Abort on the first failure.
    Strict,
    /// Log, record and continue.
    #[default]
    BestEffort,
}

impl fmt::Display for EventErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Strict => "strict",
            Self::BestEffort => "best-effort",
        };
        write!(f, "{value}")
    }
}

impl FromStr for EventErrorPolicy {
    type Err = BoardError;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            other => Err(BoardError::validation(
                "error_policy",
                format!("expected strict or best-effort, got '{other}'"),
            )),
        }
    }
}

/// A single event that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventError {
    /// 0-based position within the batch.
    pub index: usize,
    pub issue_id: Option<String>,
    pub message: String,
}

impl EventError {
    #[must_use]
    pub fn summary(&self) -> String {
        let id = self.issue_id.as_deref().unwrap_or("<unknown>");
        format!("event {} ({id}): {}", self.index, self.message)
    }
}

/// Outcome of applying a batch of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub updated: usize,
    pub moved: usize,
    pub removed: usize,
    /// Remove events for issues the store did not hold.
    pub skipped: usize,
    pub errors: Vec<EventError>,
}

impl SyncReport {
    #[must_use]
    pub fn applied(&self) -> usize {
        self.updated + self.moved + self.removed
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Fraction of events that did not fail.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let ok = self.applied() + self.skipped;
        let total = ok + self.errors.len();
        if total == 0 {
            1.0
        } else {
            ok as f64 / total as f64
        }
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} updated, {} moved, {} removed, {} skipped, {} failed",
            self.updated,
            self.moved,
            self.removed,
            self.skipped,
            self.errors.len()
        )
    }
}

enum Applied {
    Updated(Issue),
    Moved(Issue),
    Removed,
    Skipped,
}

fn apply_event(store: &mut BoardStore, event: IssueEvent) -> Result<Applied> {
    match event {
        IssueEvent::Update {
            issue,
            column,
            order,
        } => store
            .update_issue(issue, column.as_deref(), order)
            .map(Applied::Updated),
        IssueEvent::Move {
            issue,
            column,
            before,
            after,
        } => store
            .update_issue_order(issue, before.as_deref(), after.as_deref(), &column)
            .map(Applied::Moved),
        IssueEvent::Remove { id } => Ok(store
            .remove_issue_by_id(&id)
            .map_or(Applied::Skipped, |_| Applied::Removed)),
    }
}

/// Apply a batch of events to the store.
///
/// # Errors
///
/// Under `EventErrorPolicy::Strict`, returns the first event failure.
/// Events before it stay applied.
pub fn apply_events(
    store: &mut BoardStore,
    events: Vec<IssueEvent>,
    policy: EventErrorPolicy,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for (index, event) in events.into_iter().enumerate() {
        let issue_id = event.issue_id().map(str::to_string);

        match apply_event(store, event) {
            Ok(Applied::Updated(issue)) => {
                debug!(id = %issue.id, column = %issue.column, "Applied update event");
                report.updated += 1;
            }
            Ok(Applied::Moved(issue)) => {
                debug!(id = %issue.id, column = %issue.column, order = issue.order, "Applied move event");
                report.moved += 1;
            }
            Ok(Applied::Removed) => report.removed += 1,
            Ok(Applied::Skipped) => report.skipped += 1,
            Err(err) => {
                warn!(index, id = issue_id.as_deref().unwrap_or("<unknown>"), error = %err, "Skipping event");
                if policy == EventErrorPolicy::Strict {
                    return Err(err);
                }
                report.errors.push(EventError {
                    index,
                    issue_id,
                    message: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Fetch one batch from `source` and apply it.
///
/// # Errors
///
/// Returns an error if fetching fails, or per [`apply_events`].
pub fn sync_from<S: IssueSource + ?Sized>(
    source: &mut S,
    store: &mut BoardStore,
    policy: EventErrorPolicy,
) -> Result<SyncReport> {
    let events = source.fetch_events()?;
    apply_events(store, events, policy)
}

/// Write the store snapshot atomically (temp file, then rename).
///
/// # Errors
///
/// Returns an error if serialization or any file operation fails.
pub fn dump_to_file(store: &BoardStore, path: &Path) -> Result<()> {
    let json = store.serialize()?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_context("create dump directory", parent, e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let temp_file =
        File::create(&temp_path).map_err(|e| io_context("create temp dump", &temp_path, e))?;
    let mut writer = BufWriter::new(temp_file);
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| BoardError::Io(e.into_error()))?
        .sync_all()?;

    fs::rename(&temp_path, path).map_err(|e| io_context("rename temp dump", path, e))?;

    info!(path = %path.display(), issues = store.len(), "Dumped board");
    Ok(())
}

/// Restore the store from a dump file.
///
/// Returns `Ok(false)` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn restore_from_file(store: &mut BoardStore, path: &Path) -> Result<bool> {
    if !path.exists() {
        debug!(path = %path.display(), "No dump to restore");
        return Ok(false);
    }

    let json = fs::read_to_string(path).map_err(|e| io_context("read dump", path, e))?;
    store.restore(&json)?;
    Ok(true)
}
