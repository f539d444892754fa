//! Column definitions and issue classification.
//!
//! A board is an ordered list of columns. Each column optionally names a
//! GitHub label and declares whether it holds closed issues. An issue lands
//! in the first labeled column whose label it carries and whose closed flag
//! matches its state; failing that, in the first matching unlabeled column;
//! failing that, in the default column.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BoardError, Result};
use crate::model::{Issue, Label};

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(b: &bool) -> bool {
    !*b
}

/// A single configured column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,

    /// Label that places an issue in this column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Column holds closed issues.
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed: bool,

    /// Column orders its issues by link hints.
    #[serde(default, skip_serializing_if = "is_false")]
    pub sorting: bool,

    /// Fallback column when nothing else matches.
    #[serde(default, skip_serializing_if = "is_false")]
    pub default: bool,
}

impl ColumnDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            closed: false,
            sorting: false,
            default: false,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    #[must_use]
    pub const fn sorting(mut self) -> Self {
        self.sorting = true;
        self
    }

    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    fn matches(&self, issue: &Issue) -> bool {
        if self.closed != issue.state.is_closed() {
            return false;
        }
        self.label
            .as_deref()
            .is_none_or(|label| issue.has_label(label))
    }
}

/// Validated, ordered column configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    definitions: Vec<ColumnDefinition>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            definitions: default_definitions(),
        }
    }
}

/// Columns used when no configuration names any.
#[must_use]
pub fn default_definitions() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("Inbox").as_default(),
        ColumnDefinition::new("Backlog").with_label("backlog").sorting(),
        ColumnDefinition::new("Ready").with_label("ready").sorting(),
        ColumnDefinition::new("In Progress")
            .with_label("in progress")
            .sorting(),
        ColumnDefinition::new("Needs Review")
            .with_label("needs review")
            .sorting(),
        ColumnDefinition::new("Done").closed(),
    ]
}

impl Columns {
    /// Build a column set.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Validation` if the list is empty, a name is
    /// blank, or two columns share a name.
    pub fn new(definitions: Vec<ColumnDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(BoardError::validation("columns", "at least one column is required"));
        }

        let mut seen = HashSet::new();
        for definition in &definitions {
            if definition.name.trim().is_empty() {
                return Err(BoardError::validation("columns", "column name cannot be empty"));
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(BoardError::validation(
                    "columns",
                    format!("duplicate column name '{}'", definition.name),
                ));
            }
        }

        Ok(Self { definitions })
    }

    #[must_use]
    pub fn definitions(&self) -> &[ColumnDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.definitions.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn is_sorting(&self, name: &str) -> bool {
        self.get(name).is_some_and(|column| column.sorting)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|column| column.name.as_str())
    }

    fn fallback(&self) -> &ColumnDefinition {
        self.definitions
            .iter()
            .find(|column| column.default)
            .unwrap_or(&self.definitions[0])
    }

    /// Column an issue belongs in, given its state and labels.
    #[must_use]
    pub fn classify(&self, issue: &Issue) -> &str {
        let labeled = self.definitions.iter().filter(|c| c.label.is_some());
        let unlabeled = self.definitions.iter().filter(|c| c.label.is_none());

        labeled
            .chain(unlabeled)
            .find(|column| column.matches(issue))
            .unwrap_or_else(|| self.fallback())
            .name
            .as_str()
    }

    /// Mark labels that select a configured column.
    pub fn annotate_labels(&self, labels: &mut [Label]) {
        for label in labels {
            label.column_label = self
                .definitions
                .iter()
                .any(|column| column.label.as_deref() == Some(label.name.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueState, Repository};

    fn issue(state: IssueState, labels: &[&str]) -> Issue {
        let repo = Repository {
            id: 1,
            name: "y".to_string(),
            owner: "x".to_string(),
            private: false,
        };
        let mut issue = Issue::new("1-1", "x/y#1", repo);
        issue.state = state;
        issue.labels = labels.iter().map(|name| Label::new(*name)).collect();
        issue
    }

    #[test]
    fn closed_issue_goes_to_closed_column() {
        let columns = Columns::new(vec![
            ColumnDefinition::new("Inbox"),
            ColumnDefinition::new("Done").closed(),
        ])
        .unwrap();
        assert_eq!(columns.classify(&issue(IssueState::Closed, &[])), "Done");
        assert_eq!(columns.classify(&issue(IssueState::Open, &[])), "Inbox");
    }

    #[test]
    fn labeled_columns_win_over_unlabeled() {
        let columns = Columns::default();
        assert_eq!(
            columns.classify(&issue(IssueState::Open, &["in progress"])),
            "In Progress"
        );
    }

    #[test]
    fn definition_order_breaks_label_ties() {
        let columns = Columns::default();
        let both = issue(IssueState::Open, &["in progress", "backlog"]);
        assert_eq!(columns.classify(&both), "Backlog");
    }

    #[test]
    fn closed_label_mismatch_falls_through() {
        let columns = Columns::default();
        let closed = issue(IssueState::Closed, &["backlog"]);
        assert_eq!(columns.classify(&closed), "Done");
    }

    #[test]
    fn falls_back_to_default_column() {
        let columns = Columns::new(vec![
            ColumnDefinition::new("Triage").with_label("triage"),
            ColumnDefinition::new("Icebox").as_default().with_label("icebox"),
        ])
        .unwrap();
        assert_eq!(columns.classify(&issue(IssueState::Open, &[])), "Icebox");
    }

    #[test]
    fn falls_back_to_first_column_without_default() {
        let columns = Columns::new(vec![
            ColumnDefinition::new("Open").with_label("open"),
            ColumnDefinition::new("Closed").closed(),
        ])
        .unwrap();
        assert_eq!(columns.classify(&issue(IssueState::Open, &[])), "Open");
    }

    #[test]
    fn rejects_empty_and_duplicate() {
        assert!(Columns::new(vec![]).is_err());
        assert!(
            Columns::new(vec![ColumnDefinition::new("A"), ColumnDefinition::new("A")]).is_err()
        );
    }

    #[test]
    fn annotate_marks_column_labels_only() {
        let columns = Columns::default();
        let mut labels = vec![Label::new("bug"), Label::new("ready")];
        columns.annotate_labels(&mut labels);
        assert!(!labels[0].column_label);
        assert!(labels[1].column_label);
    }

    #[test]
    fn yaml_definition() {
        let yaml = "- name: Inbox\n  default: true\n- name: Doing\n  label: doing\n  sorting: true\n";
        let defs: Vec<ColumnDefinition> = serde_yaml::from_str(yaml).unwrap();
        let columns = Columns::new(defs).unwrap();
        assert!(columns.is_sorting("Doing"));
        assert!(!columns.is_sorting("Inbox"));
        assert_eq!(columns.names().collect::<Vec<_>>(), vec!["Inbox", "Doing"]);
    }
}
