//! Error types and handling for `issue_board`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the binary edge
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers
//!
//! Store operations are synchronous and never retry. Every error surfaces
//! to the caller (webhook handler, sync job, CLI command) which decides
//! whether the upstream fetch is worth repeating.

mod structured;

pub use structured::{ErrorCode, StructuredError};

use thiserror::Error;

/// Primary error type for `issue_board` operations.
#[derive(Error, Debug)]
pub enum BoardError {
    // === Payload Errors ===
    /// An issue payload lacks one of the fields the store keys on.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    /// Link type outside the fixed enumeration.
    #[error("Invalid link type: {link_type}")]
    InvalidLinkType { link_type: String },

    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Store Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    /// A caller-driven move named a column that is not configured.
    #[error("Unknown column: {name}")]
    UnknownColumn { name: String },

    // === Event Source Errors ===
    /// Failed to parse a line of an event file.
    #[error("Event parse error at line {line}: {reason}")]
    EventParse { line: usize, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Board directory not found.
    #[error("Board not initialized: run 'board init' or set BOARD_DIR")]
    NotInitialized,

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::IssueNotFound { .. }
                | Self::UnknownColumn { .. }
                | Self::Validation { .. }
                | Self::MissingRequiredField { .. }
                | Self::EventParse { .. }
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: board init"),
            Self::MissingRequiredField { .. } => {
                Some("Issue payloads need id, key and repository (or repository + number)")
            }
            Self::UnknownColumn { .. } => Some("Run: board columns"),
            Self::InvalidLinkType { .. } => Some(
                "Valid link types: CLOSES, CLOSED_BY, LINKED_TO, LINKED_BY, DEPENDS_ON, REQUIRED_BY, CHILD_OF, PARENT_OF",
            ),
            Self::IssueNotFound { .. } => Some("Run: board show"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with a context message.
    pub fn with_context(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type using `BoardError`.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Path-carrying helper used when file operations fail.
pub(crate) fn io_context(action: &str, path: &std::path::Path, err: std::io::Error) -> BoardError {
    BoardError::with_context(format!("{action} '{}'", path.display()), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoardError::IssueNotFound {
            id: "42-7".to_string(),
        };
        assert_eq!(err.to_string(), "Issue not found: 42-7");

        let err = BoardError::MissingRequiredField { field: "key" };
        assert_eq!(err.to_string(), "Missing required field: key");
    }

    #[test]
    fn test_validation_error() {
        let err = BoardError::validation("columns", "must not be empty");
        assert_eq!(err.to_string(), "Validation failed: columns: must not be empty");
    }

    #[test]
    fn test_user_recoverable() {
        assert!(BoardError::NotInitialized.is_user_recoverable());
        assert!(BoardError::MissingRequiredField { field: "id" }.is_user_recoverable());

        let io = BoardError::Io(std::io::Error::other("disk gone"));
        assert!(!io.is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = BoardError::UnknownColumn {
            name: "Nope".to_string(),
        };
        assert_eq!(err.suggestion(), Some("Run: board columns"));
        assert!(BoardError::Config("x".into()).suggestion().is_none());
    }

    #[test]
    fn test_with_context_keeps_source() {
        let err = io_context(
            "read dump",
            std::path::Path::new("/tmp/board.json"),
            std::io::Error::other("boom"),
        );
        assert_eq!(err.to_string(), "read dump '/tmp/board.json': boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
