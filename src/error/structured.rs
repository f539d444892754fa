//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Board Errors (exit code 2) ===
    /// Board directory not found
    NotInitialized,

    // === Issue Errors (exit code 3) ===
    /// Issue with specified ID not found
    IssueNotFound,
    /// Move targeted a column that is not configured
    UnknownColumn,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Required field missing from an issue payload
    RequiredField,
    /// Link type outside the fixed enumeration
    InvalidLinkType,

    // === Event Source Errors (exit code 6) ===
    /// Event file line could not be parsed
    EventParseError,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::UnknownColumn => "UNKNOWN_COLUMN",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::InvalidLinkType => "INVALID_LINK_TYPE",
            Self::EventParseError => "EVENT_PARSE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Retryable means the caller might succeed if it fixes the input
    /// (or re-fetches the upstream payload) and tries again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::RequiredField | Self::UnknownColumn | Self::IoError
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Board errors
    /// - 3: Issue errors
    /// - 4: Validation errors
    /// - 6: Event source errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotInitialized => 2,
            Self::IssueNotFound | Self::UnknownColumn => 3,
            Self::ValidationFailed | Self::RequiredField | Self::InvalidLinkType => 4,
            Self::EventParseError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `BoardError`.
    #[must_use]
    pub fn from_error(err: &BoardError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &BoardError) -> (ErrorCode, Option<Value>) {
        match err {
            BoardError::NotInitialized => (ErrorCode::NotInitialized, None),
            BoardError::IssueNotFound { id } => {
                (ErrorCode::IssueNotFound, Some(json!({"searched_id": id})))
            }
            BoardError::UnknownColumn { name } => {
                (ErrorCode::UnknownColumn, Some(json!({"column": name})))
            }
            BoardError::MissingRequiredField { field } => {
                (ErrorCode::RequiredField, Some(json!({"field": field})))
            }
            BoardError::InvalidLinkType { link_type } => (
                ErrorCode::InvalidLinkType,
                Some(json!({"link_type": link_type})),
            ),
            BoardError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            BoardError::EventParse { line, reason } => (
                ErrorCode::EventParseError,
                Some(json!({"line": line, "reason": reason})),
            ),
            BoardError::Config(_) => (ErrorCode::ConfigError, None),
            BoardError::Io(_) => (ErrorCode::IoError, None),
            BoardError::Json(_) => (ErrorCode::JsonError, None),
            BoardError::Yaml(_) => (ErrorCode::YamlError, None),
            BoardError::WithContext { context, source } => {
                let code = if source.is::<std::io::Error>() {
                    ErrorCode::IoError
                } else {
                    ErrorCode::InternalError
                };
                (code, Some(json!({"context": context})))
            }
            BoardError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &BoardError) -> Option<String> {
        if let Some(suggestion) = err.suggestion() {
            return Some(suggestion.to_string());
        }

        match err {
            BoardError::EventParse { line, .. } => Some(format!(
                "Check line {line} of the event file for syntax errors."
            )),
            BoardError::Config(_) => {
                Some("Check .board/config.yaml and BOARD_* environment variables.".to_string())
            }
            _ => None,
        }
    }
}
