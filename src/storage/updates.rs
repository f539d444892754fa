//! Compacting, append-only update log.
//!
//! Clients save the id of the head entry as their cursor and later ask for
//! everything after it. Entries are tracked per issue: appending a new entry
//! for an issue tombstones its previous one, so a catch-up returns at most
//! one entry per issue regardless of how often it changed.
//!
//! Slot 0 holds a dummy entry so a missing or unknown cursor has a defined
//! starting point (full replay).

use chrono::Utc;
use std::collections::HashMap;

use crate::model::{UpdateEntry, UpdateKind, UpdatePayload};

#[derive(Debug, Clone)]
struct Slot {
    id: String,
    entry: Option<UpdateEntry>,
    tombstone: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateLog {
    slots: Vec<Slot>,
    index_by_id: HashMap<String, usize>,
    tracked: HashMap<String, usize>,
    start: u64,
}

impl Default for UpdateLog {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateLog {
    /// Create a log whose cursors start at the current time in milliseconds.
    ///
    /// Cursors from a previous process therefore never collide with new ones
    /// and fall back to a full replay.
    #[must_use]
    pub fn new() -> Self {
        let start = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self::with_start(start)
    }

    /// Create a log with a fixed first cursor.
    #[must_use]
    pub fn with_start(start: u64) -> Self {
        let dummy = Slot {
            id: start.to_string(),
            entry: None,
            tombstone: false,
        };
        let mut index_by_id = HashMap::new();
        index_by_id.insert(dummy.id.clone(), 0);

        Self {
            slots: vec![dummy],
            index_by_id,
            tracked: HashMap::new(),
            start,
        }
    }

    /// Append an entry, tombstoning the previous entry tracked under `track_key`.
    ///
    /// Returns the new entry's cursor.
    pub fn add(&mut self, track_key: Option<&str>, kind: UpdateKind, issue: UpdatePayload) -> String {
        let index = self.slots.len();
        let id = (self.start + index as u64).to_string();

        if let Some(key) = track_key {
            if let Some(previous) = self.tracked.insert(key.to_string(), index) {
                self.slots[previous].tombstone = true;
            }
        }

        let entry = UpdateEntry {
            id: id.clone(),
            kind,
            issue,
        };
        self.index_by_id.insert(id.clone(), index);
        self.slots.push(Slot {
            id: id.clone(),
            entry: Some(entry),
            tombstone: false,
        });

        id
    }

    /// Cursor of the latest entry.
    #[must_use]
    pub fn head_id(&self) -> &str {
        self.slots.last().map_or("", |slot| slot.id.as_str())
    }

    /// Latest entry, if anything was ever appended.
    #[must_use]
    pub fn head(&self) -> Option<&UpdateEntry> {
        self.slots.last().and_then(|slot| slot.entry.as_ref())
    }

    /// Live entries strictly after `cursor`, oldest first.
    ///
    /// A missing or unknown cursor replays the whole log.
    #[must_use]
    pub fn since(&self, cursor: Option<&str>) -> Vec<&UpdateEntry> {
        let start = cursor
            .and_then(|cursor| self.index_by_id.get(cursor))
            .copied()
            .unwrap_or(0);

        self.slots[start + 1..]
            .iter()
            .filter(|slot| !slot.tombstone)
            .filter_map(|slot| slot.entry.as_ref())
            .collect()
    }

    /// Number of entries appended, tombstoned ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RemovedIssue, Repository};

    fn payload(id: &str) -> UpdatePayload {
        UpdatePayload::Removed(RemovedIssue {
            id: id.to_string(),
            key: format!("x/y#{id}"),
            repository: Repository {
                id: 1,
                name: "y".to_string(),
                owner: "x".to_string(),
                private: false,
            },
            links: vec![],
        })
    }

    #[test]
    fn empty_log_has_dummy_head() {
        let log = UpdateLog::with_start(1000);
        assert_eq!(log.head_id(), "1000");
        assert!(log.head().is_none());
        assert!(log.since(None).is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn ids_increase() {
        let mut log = UpdateLog::with_start(1000);
        let first = log.add(Some("a"), UpdateKind::Update, payload("a"));
        let second = log.add(Some("b"), UpdateKind::Update, payload("b"));
        assert_eq!(first, "1001");
        assert_eq!(second, "1002");
        assert_eq!(log.head_id(), "1002");
    }

    #[test]
    fn tracked_key_compacts() {
        let mut log = UpdateLog::with_start(0);
        let initial = log.head_id().to_string();
        for _ in 0..5 {
            log.add(Some("k"), UpdateKind::Update, payload("k"));
        }
        let entries = log.since(Some(&initial));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, log.head_id());
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn untracked_entries_are_never_tombstoned() {
        let mut log = UpdateLog::with_start(0);
        log.add(None, UpdateKind::Update, payload("k"));
        log.add(None, UpdateKind::Update, payload("k"));
        assert_eq!(log.since(None).len(), 2);
    }

    #[test]
    fn cursor_on_tombstone_still_resolves() {
        let mut log = UpdateLog::with_start(0);
        let first = log.add(Some("a"), UpdateKind::Update, payload("a"));
        log.add(Some("b"), UpdateKind::Update, payload("b"));
        log.add(Some("a"), UpdateKind::Remove, payload("a"));

        let entries = log.since(Some(&first));
        let ids: Vec<_> = entries.iter().map(|entry| entry.issue.id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn unknown_cursor_replays_everything() {
        let mut log = UpdateLog::with_start(0);
        log.add(Some("a"), UpdateKind::Update, payload("a"));
        log.add(Some("b"), UpdateKind::Update, payload("b"));
        assert_eq!(log.since(Some("not-a-cursor")).len(), 2);
        assert!(log.since(Some(log.head_id())).is_empty());
    }
}
