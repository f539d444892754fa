//! Issue identity helpers.
//!
//! Two identifiers exist for every issue:
//! - `id`: `<repository id>-<number>`, stable across repository renames
//! - `key`: `<owner>/<repo>#<number>`, human-readable and used to resolve
//!   text references

use crate::error::{BoardError, Result};

/// Build the stable id for an issue.
#[must_use]
pub fn issue_id(repository_id: u64, number: u64) -> String {
    format!("{repository_id}-{number}")
}

/// Build the repo-qualified key for an issue.
#[must_use]
pub fn issue_key(owner: &str, repo: &str, number: u64) -> String {
    format!("{owner}/{repo}#{number}")
}

/// Parsed components of an issue key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl ParsedKey {
    /// Render back to `owner/repo#number`.
    #[must_use]
    pub fn to_key(&self) -> String {
        issue_key(&self.owner, &self.repo, self.number)
    }
}

/// Parse an `owner/repo#number` key.
///
/// # Errors
///
/// Returns `BoardError::Validation` if the input is not a well-formed key.
pub fn parse_key(key: &str) -> Result<ParsedKey> {
    let invalid = || BoardError::validation("key", format!("expected owner/repo#number, got '{key}'"));

    let (slug, number) = key.trim().split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = slug.split_once('/').ok_or_else(invalid)?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }

    let number = number.parse::<u64>().map_err(|_| invalid())?;

    Ok(ParsedKey {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

/// Quick check whether a string looks like an issue key rather than an id.
#[must_use]
pub fn is_key_format(input: &str) -> bool {
    parse_key(input).is_ok()
}
