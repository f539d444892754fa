//! Validation helpers for `issue_board`.
//!
//! These routines check inbound payloads before the store touches any of
//! its state, so a rejected update never leaves a partial mutation behind.

use crate::error::{BoardError, Result};
use crate::model::{IssuePatch, Repository};

/// Identity fields every stored issue must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchIdentity {
    pub id: String,
    pub key: String,
    pub repository: Repository,
}

/// Validates issue payloads.
pub struct IssueValidator;

impl IssueValidator {
    /// Check that a patch carries `id`, `key` and `repository`.
    ///
    /// Blank strings count as missing.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::MissingRequiredField` naming the first absent
    /// field, or `BoardError::Validation` if the repository has no owner or name.
    pub fn validate_patch(patch: &IssuePatch) -> Result<PatchIdentity> {
        let id = non_blank(patch.id.as_deref()).ok_or(BoardError::MissingRequiredField { field: "id" })?;
        let key =
            non_blank(patch.key.as_deref()).ok_or(BoardError::MissingRequiredField { field: "key" })?;
        let repository = patch
            .repository
            .clone()
            .ok_or(BoardError::MissingRequiredField {
                field: "repository",
            })?;

        if repository.owner.trim().is_empty() || repository.name.trim().is_empty() {
            return Err(BoardError::validation(
                "repository",
                "owner and name cannot be empty",
            ));
        }

        Ok(PatchIdentity {
            id: id.to_string(),
            key: key.to_string(),
            repository,
        })
    }

    /// Check a caller-supplied order value.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Validation` if the value is NaN or infinite.
    pub fn validate_order(order: f64) -> Result<()> {
        if order.is_finite() {
            Ok(())
        } else {
            Err(BoardError::validation("order", "must be a finite number"))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
