//! Core data types for `issue_board`.
//!
//! This module defines the fundamental types used throughout the crate:
//! - `Issue` - The canonical board record, owned by the store
//! - `IssuePatch` - A partial issue payload from an issue source
//! - `LinkType` / `Link` - Typed relations between issues
//! - `Board` - The grouped-by-column read model
//! - `UpdateEntry` - Update log records handed to polling clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Payload keys that are derived by the store and never taken from a source.
const DERIVED_KEYS: &[&str] = &["column", "order", "links"];

/// Issue / pull request state as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueState {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(BoardError::validation(
                "state",
                format!("expected open or closed, got '{other}'"),
            )),
        }
    }
}

/// Denormalized repository metadata carried on every issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    /// GitHub repository id.
    pub id: u64,
    /// Repository name (without owner).
    pub name: String,
    /// Owner login.
    pub owner: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,
}

impl Repository {
    /// `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// An issue label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Set by the store when the label selects a configured column.
    #[serde(default, skip_serializing_if = "is_false")]
    pub column_label: bool,
}

impl Label {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            column_label: false,
        }
    }
}

/// A GitHub user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A milestone reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
}

/// The canonical issue record owned by the board store.
///
/// `column` and `order` are derived: the store recomputes them on every
/// update. Fields the store does not model (check runs, statuses, reviews,
/// comments attached by background sync) live in `extra` and survive merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable id derived from repository id + number.
    pub id: String,

    /// `owner/repo#number`.
    pub key: String,

    /// Issue or pull request number.
    pub number: u64,

    pub repository: Repository,

    #[serde(default)]
    pub state: IssueState,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,

    /// True for pull requests.
    #[serde(default, skip_serializing_if = "is_false")]
    pub pull_request: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Column this issue currently occupies.
    #[serde(default)]
    pub column: String,

    /// Sort key within the column.
    #[serde(default)]
    pub order: f64,

    /// Auxiliary sync data, shallow-merged across updates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Issue {
    /// Create an empty issue carrying only its identity.
    #[must_use]
    pub fn new(id: impl Into<String>, key: impl Into<String>, repository: Repository) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            number: 0,
            repository,
            state: IssueState::Open,
            title: String::new(),
            body: None,
            labels: Vec::new(),
            assignees: Vec::new(),
            milestone: None,
            pull_request: false,
            created_at: None,
            updated_at: None,
            closed_at: None,
            column: String::new(),
            order: 0.0,
            extra: BTreeMap::new(),
        }
    }

    /// Shallow-merge a patch over this issue.
    ///
    /// Present fields win; absent fields leave the current value untouched.
    /// Absence never means "clear".
    pub fn apply(&mut self, patch: IssuePatch) {
        let IssuePatch {
            id,
            key,
            number,
            repository,
            state,
            title,
            body,
            labels,
            assignees,
            milestone,
            pull_request,
            created_at,
            updated_at,
            closed_at,
            extra,
        } = patch;

        if let Some(id) = id {
            self.id = id;
        }
        if let Some(key) = key {
            self.key = key;
        }
        if let Some(number) = number {
            self.number = number;
        }
        if let Some(repository) = repository {
            self.repository = repository;
        }
        if let Some(state) = state {
            self.state = state;
        }
        if let Some(title) = title {
            self.title = title;
        }
        if body.is_some() {
            self.body = body;
        }
        if let Some(labels) = labels {
            self.labels = labels;
        }
        if let Some(assignees) = assignees {
            self.assignees = assignees;
        }
        if milestone.is_some() {
            self.milestone = milestone;
        }
        if let Some(pull_request) = pull_request {
            self.pull_request = pull_request;
        }
        if created_at.is_some() {
            self.created_at = created_at;
        }
        if updated_at.is_some() {
            self.updated_at = updated_at;
        }
        if closed_at.is_some() {
            self.closed_at = closed_at;
        }
        for (name, value) in extra {
            if DERIVED_KEYS.contains(&name.as_str()) {
                continue;
            }
            self.extra.insert(name, value);
        }
    }

    /// Text scanned for issue references: title, a rule, then the body.
    #[must_use]
    pub fn reference_text(&self) -> String {
        format!("{}\n---\n{}", self.title, self.body.as_deref().unwrap_or(""))
    }

    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }
}

/// A partial issue payload.
///
/// Every field is optional; `None` means "no change". The store validates
/// that `id`, `key` and `repository` are present before touching anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IssuePatch {
    /// Fill `id` and `key` from `repository` + `number` when a source omitted them.
    #[must_use]
    pub fn with_derived_identity(mut self) -> Self {
        if let (Some(repository), Some(number)) = (&self.repository, self.number) {
            if self.id.is_none() {
                self.id = Some(crate::util::id::issue_id(repository.id, number));
            }
            if self.key.is_none() {
                self.key = Some(crate::util::id::issue_key(
                    &repository.owner,
                    &repository.name,
                    number,
                ));
            }
        }
        self
    }
}

impl From<Issue> for IssuePatch {
    fn from(issue: Issue) -> Self {
        Self {
            id: Some(issue.id),
            key: Some(issue.key),
            number: Some(issue.number),
            repository: Some(issue.repository),
            state: Some(issue.state),
            title: Some(issue.title),
            body: issue.body,
            labels: Some(issue.labels),
            assignees: Some(issue.assignees),
            milestone: issue.milestone,
            pull_request: Some(issue.pull_request),
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            extra: issue.extra,
        }
    }
}

/// Typed relation between two issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum LinkType {
    Closes,
    ClosedBy,
    LinkedTo,
    LinkedBy,
    DependsOn,
    RequiredBy,
    ChildOf,
    ParentOf,
}

/// Where a link asks its source issue to sit relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Source sorts immediately after the target.
    After,
    /// Source sorts immediately before the target.
    Before,
}

impl LinkType {
    pub const ALL: [Self; 8] = [
        Self::Closes,
        Self::ClosedBy,
        Self::LinkedTo,
        Self::LinkedBy,
        Self::DependsOn,
        Self::RequiredBy,
        Self::ChildOf,
        Self::ParentOf,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closes => "CLOSES",
            Self::ClosedBy => "CLOSED_BY",
            Self::LinkedTo => "LINKED_TO",
            Self::LinkedBy => "LINKED_BY",
            Self::DependsOn => "DEPENDS_ON",
            Self::RequiredBy => "REQUIRED_BY",
            Self::ChildOf => "CHILD_OF",
            Self::ParentOf => "PARENT_OF",
        }
    }

    /// Inverse type materialized on the target side.
    ///
    /// `CLOSED_BY` and `LINKED_BY` are purely inverse and have none.
    #[must_use]
    pub const fn inverse(&self) -> Option<Self> {
        match self {
            Self::Closes => Some(Self::ClosedBy),
            Self::LinkedTo => Some(Self::LinkedBy),
            Self::DependsOn => Some(Self::RequiredBy),
            Self::RequiredBy => Some(Self::DependsOn),
            Self::ChildOf => Some(Self::ParentOf),
            Self::ParentOf => Some(Self::ChildOf),
            Self::ClosedBy | Self::LinkedBy => None,
        }
    }

    /// Ordering hint this link gives its source within a sorting column.
    #[must_use]
    pub const fn placement(&self) -> Option<Placement> {
        match self {
            Self::Closes | Self::RequiredBy | Self::ChildOf => Some(Placement::After),
            Self::DependsOn | Self::ClosedBy | Self::ParentOf => Some(Placement::Before),
            Self::LinkedTo | Self::LinkedBy => None,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|link_type| link_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BoardError::InvalidLinkType {
                link_type: s.to_string(),
            })
    }
}

impl TryFrom<String> for LinkType {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A directed edge in the link graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl Link {
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            link_type,
        }
    }

    /// Key of this link within its source bucket: `{target_id}-{TYPE}`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.target_id, self.link_type.as_str())
    }
}

/// A link materialized against the store, carrying the resolved target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueLink {
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub target: Issue,
}

/// An issue as rendered on the board: the record plus its materialized links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardIssue {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(default)]
    pub links: Vec<IssueLink>,
}

/// One column of the board, issues in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub name: String,
    pub issues: Vec<BoardIssue>,
}

/// Grouped-by-column snapshot, columns in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
}

impl Board {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Total number of issues across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(|column| column.issues.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply an external read predicate (search, access control) to a snapshot.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Issue) -> bool,
    {
        Self {
            columns: self
                .columns
                .iter()
                .map(|column| BoardColumn {
                    name: column.name.clone(),
                    issues: column
                        .issues
                        .iter()
                        .filter(|entry| predicate(&entry.issue))
                        .cloned()
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Kind of update log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Update,
    Remove,
}

/// Minimal record emitted when an issue leaves the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedIssue {
    pub id: String,
    pub key: String,
    pub repository: Repository,
    #[serde(default)]
    pub links: Vec<IssueLink>,
}

/// Issue payload of an update entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    Issue(BoardIssue),
    Removed(RemovedIssue),
}

impl UpdatePayload {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Issue(entry) => &entry.issue.id,
            Self::Removed(removed) => &removed.id,
        }
    }
}

/// A client-visible update log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    /// Opaque cursor.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub issue: UpdatePayload,
}
