//! Shared utilities for `issue_board`.
//!
//! - Issue identity (`id` / `key`) construction and parsing
//! - Reference extraction from issue text

pub mod id;
pub mod references;

pub use id::{ParsedKey, issue_id, issue_key, parse_key};
pub use references::{ParsedLink, find_links, find_links_in_text};
