//! Command implementations.
//!
//! Every command except `init` runs against a [`BoardContext`]: the
//! resolved configuration plus a store restored from the dump file.

pub mod columns;
pub mod ingest;
pub mod init;
pub mod links;
pub mod move_issue;
pub mod remove;
pub mod show;

use tracing::debug;

use crate::config::BoardConfig;
use crate::error::Result;
use crate::storage::BoardStore;
use crate::sync::{dump_to_file, restore_from_file};

/// Configuration and restored store for one command run.
#[derive(Debug)]
pub struct BoardContext {
    pub config: BoardConfig,
    pub store: BoardStore,
}

impl BoardContext {
    /// Build a store from `config` and restore the dump if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump exists but cannot be read or parsed.
    pub fn open(config: BoardConfig) -> Result<Self> {
        let mut store = BoardStore::new(config.columns.clone());
        let restored = restore_from_file(&mut store, &config.dump_file)?;
        debug!(dump = %config.dump_file.display(), restored, issues = store.len(), "Opened board");
        Ok(Self { config, store })
    }

    /// Write the store back to the dump file.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump cannot be written.
    pub fn save(&self) -> Result<()> {
        dump_to_file(&self.store, &self.config.dump_file)
    }
}
