//! In-memory board storage.
//!
//! - `board`: the aggregate store
//! - `links`: bidirectional link graph
//! - `order`: fractional ordering
//! - `updates`: compacting update log

pub mod board;
pub mod links;
pub mod order;
pub mod updates;

pub use board::{BoardSnapshot, BoardStore};
pub use links::{LinkGraph, LinkGraphDump};
pub use order::{GAP, INITIAL_ORDER, compute_order};
pub use updates::UpdateLog;
