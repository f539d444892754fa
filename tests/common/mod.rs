#![allow(dead_code)]

use issue_board::columns::Columns;
use issue_board::storage::{BoardStore, UpdateLog};
use std::sync::Once;
use std::time::Instant;
use tracing::info;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        issue_board::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

/// Store with the default columns and a log starting at cursor `0`.
pub fn test_store() -> BoardStore {
    init_test_logging();
    BoardStore::with_update_log(Columns::default(), UpdateLog::with_start(0))
}

pub fn test_store_with(columns: Columns) -> BoardStore {
    init_test_logging();
    BoardStore::with_update_log(columns, UpdateLog::with_start(0))
}
