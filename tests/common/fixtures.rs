#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use issue_board::model::{IssuePatch, IssueState, Label, Repository};
use serde_json::json;

/// Fixed timestamp so snapshots stay deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0).unwrap() // 2025-01-01 00:00:00 UTC
}

pub fn repo(id: u64, owner: &str, name: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        owner: owner.to_string(),
        private: false,
    }
}

/// `x/y`, repository id 1.
pub fn default_repo() -> Repository {
    repo(1, "x", "y")
}

pub struct PatchBuilder {
    patch: IssuePatch,
}

impl PatchBuilder {
    /// Issue `number` in `x/y` with id and key derived from them.
    pub fn new(number: u64) -> Self {
        Self::in_repo(default_repo(), number)
    }

    pub fn in_repo(repository: Repository, number: u64) -> Self {
        Self {
            patch: IssuePatch {
                number: Some(number),
                repository: Some(repository),
                title: Some(format!("Issue {number}")),
                created_at: Some(base_time()),
                ..Default::default()
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.patch.title = Some(title.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.patch.body = Some(body.to_string());
        self
    }

    pub fn labels(mut self, names: &[&str]) -> Self {
        self.patch.labels = Some(names.iter().map(|name| Label::new(*name)).collect());
        self
    }

    pub fn closed(mut self) -> Self {
        self.patch.state = Some(IssueState::Closed);
        self.patch.closed_at = Some(base_time());
        self
    }

    pub fn build(self) -> IssuePatch {
        self.patch.with_derived_identity()
    }
}

pub fn patch(number: u64) -> IssuePatch {
    PatchBuilder::new(number).build()
}

pub fn patch_with_body(number: u64, body: &str) -> IssuePatch {
    PatchBuilder::new(number).body(body).build()
}

/// One `update` event line for a JSONL file.
pub fn update_event(number: u64, title: &str, body: &str, labels: &[&str]) -> String {
    json!({
        "action": "update",
        "issue": {
            "number": number,
            "repository": {"id": 1, "name": "y", "owner": "x"},
            "title": title,
            "body": body,
            "labels": labels.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
        }
    })
    .to_string()
}

pub fn remove_event(id: &str) -> String {
    json!({"action": "remove", "id": id}).to_string()
}
