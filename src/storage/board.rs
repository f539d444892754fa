//! The in-memory board store.
//!
//! Owns every issue, its derived column and order, the link graph between
//! issues, and the update log clients poll. All mutations go through
//! [`BoardStore::update_issue`] and [`BoardStore::remove_issue_by_id`].

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, trace};

use crate::columns::Columns;
use crate::error::{BoardError, Result};
use crate::model::{
    Board, BoardColumn, BoardIssue, Issue, IssueLink, IssuePatch, Link, Placement, RemovedIssue,
    UpdateEntry, UpdateKind, UpdatePayload,
};
use crate::storage::links::{LinkGraph, LinkGraphDump};
use crate::storage::order::{self, INITIAL_ORDER};
use crate::storage::updates::UpdateLog;
use crate::util::id::issue_key;
use crate::util::references::find_links;
use crate::validation::IssueValidator;

/// Side effects collected while a single mutation runs.
struct MutationContext {
    op_name: &'static str,
    /// Issues whose own link set changed; each gets an update entry.
    touched: BTreeSet<String>,
    /// Issues whose materialized link list must be rebuilt.
    stale_links: BTreeSet<String>,
}

impl MutationContext {
    fn new(op_name: &'static str) -> Self {
        Self {
            op_name,
            touched: BTreeSet::new(),
            stale_links: BTreeSet::new(),
        }
    }

    fn touch(&mut self, id: &str) {
        self.touched.insert(id.to_string());
        self.stale_links.insert(id.to_string());
    }

    fn mark_stale<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        self.stale_links.extend(ids.into_iter().cloned());
    }
}

/// Serializable form of the store used by dump/restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Issues in ascending order.
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub issue_order: BTreeMap<String, f64>,
    #[serde(default)]
    pub issue_column: BTreeMap<String, String>,
    #[serde(default)]
    pub links: LinkGraphDump,
}

#[derive(Debug)]
pub struct BoardStore {
    columns: Columns,
    /// Issue ids, ascending by order.
    issues: Vec<String>,
    issues_by_id: HashMap<String, Issue>,
    issues_by_key: HashMap<String, String>,
    issue_order: HashMap<String, f64>,
    issue_column: HashMap<String, String>,
    links: LinkGraph,
    linked_cache: Mutex<HashMap<String, Vec<IssueLink>>>,
    board_cache: OnceCell<Board>,
    updates: UpdateLog,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new(Columns::default())
    }
}

impl BoardStore {
    #[must_use]
    pub fn new(columns: Columns) -> Self {
        Self::with_update_log(columns, UpdateLog::new())
    }

    /// Create a store around an existing update log.
    #[must_use]
    pub fn with_update_log(columns: Columns, updates: UpdateLog) -> Self {
        Self {
            columns,
            issues: Vec::new(),
            issues_by_id: HashMap::new(),
            issues_by_key: HashMap::new(),
            issue_order: HashMap::new(),
            issue_column: HashMap::new(),
            links: LinkGraph::new(),
            linked_cache: Mutex::new(HashMap::new()),
            board_cache: OnceCell::new(),
            updates,
        }
    }

    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    // === Mutations ===

    /// Create or update an issue.
    ///
    /// The patch is shallow-merged over the stored issue. Links are
    /// recomputed from the merged title and body, the column is classified
    /// unless `explicit_column` is given, and the order is derived from link
    /// hints unless `explicit_order` is given.
    ///
    /// # Errors
    ///
    /// - `BoardError::MissingRequiredField` if `id`, `key` or `repository` is absent
    /// - `BoardError::UnknownColumn` if `explicit_column` is not configured
    /// - `BoardError::Validation` for a non-finite order or a key owned by another issue
    ///
    /// Nothing is mutated when an error is returned.
    pub fn update_issue(
        &mut self,
        patch: IssuePatch,
        explicit_column: Option<&str>,
        explicit_order: Option<f64>,
    ) -> Result<Issue> {
        let identity = IssueValidator::validate_patch(&patch)?;
        if let Some(column) = explicit_column {
            if !self.columns.contains(column) {
                return Err(BoardError::UnknownColumn {
                    name: column.to_string(),
                });
            }
        }
        if let Some(order) = explicit_order {
            IssueValidator::validate_order(order)?;
        }
        if let Some(owner) = self.issues_by_key.get(&identity.key) {
            if owner != &identity.id {
                return Err(BoardError::validation(
                    "key",
                    format!("'{}' already belongs to issue {owner}", identity.key),
                ));
            }
        }

        let id = identity.id.clone();
        let mut ctx = MutationContext::new("update_issue");

        let previous = self.issues_by_id.get(&id).cloned();
        let mut issue = previous
            .clone()
            .unwrap_or_else(|| Issue::new(identity.id, identity.key, identity.repository));
        issue.apply(patch);

        self.apply_links(&issue, &mut ctx);

        let previous_column = self.issue_column.get(&id).cloned();
        let column = explicit_column.map_or_else(
            || self.columns.classify(&issue).to_string(),
            ToString::to_string,
        );
        let stays = previous_column.as_deref() == Some(column.as_str());
        let current_order = self.issue_order.get(&id).copied();

        let order = match explicit_order {
            Some(order) => order,
            None => self
                .linked_order(&id, &column, current_order.filter(|_| stays))
                .unwrap_or_else(|| match current_order {
                    Some(current) if stays => current,
                    _ => self.top_of_column(&column, &id),
                }),
        };

        issue.column.clone_from(&column);
        issue.order = order;
        self.columns.annotate_labels(&mut issue.labels);

        if let Some(previous) = &previous {
            if previous.key != issue.key {
                self.issues_by_key.remove(&previous.key);
            }
        }
        self.issues_by_key.insert(issue.key.clone(), id.clone());
        self.issue_order.insert(id.clone(), order);
        self.issue_column.insert(id.clone(), column.clone());
        self.reinsert(&id, order);
        self.issues_by_id.insert(id.clone(), issue.clone());

        // Neighbors hold a copy of this issue in their materialized links.
        let neighbors = self.neighbor_ids(&id);
        ctx.mark_stale(&neighbors);
        ctx.stale_links.insert(id.clone());
        self.invalidate(&ctx);

        debug!(
            op = ctx.op_name,
            id = %id,
            column = %column,
            order,
            touched = ctx.touched.len(),
            "Updated issue"
        );

        self.record_update(&id);
        for touched in &ctx.touched {
            if touched != &id {
                self.record_update(touched);
            }
        }

        Ok(issue)
    }

    /// Move an issue between two neighbors, optionally into another column.
    ///
    /// `before_id` names the issue that should follow, `after_id` the one
    /// that should precede. Unknown neighbor ids are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`BoardStore::update_issue`].
    pub fn update_issue_order(
        &mut self,
        patch: IssuePatch,
        before_id: Option<&str>,
        after_id: Option<&str>,
        column: &str,
    ) -> Result<Issue> {
        let identity = IssueValidator::validate_patch(&patch)?;
        let current = self.issue_order.get(&identity.id).copied();
        let order = self.compute_order(before_id, after_id, current);
        self.update_issue(patch, Some(column), Some(order))
    }

    /// Move a stored issue without supplying a payload.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::IssueNotFound` if `id` is not stored, otherwise
    /// the errors of [`BoardStore::update_issue`].
    pub fn move_issue(
        &mut self,
        id: &str,
        column: &str,
        before_id: Option<&str>,
        after_id: Option<&str>,
    ) -> Result<Issue> {
        let issue = self
            .issues_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| BoardError::IssueNotFound { id: id.to_string() })?;
        self.update_issue_order(IssuePatch::from(issue), before_id, after_id, column)
    }

    /// Remove an issue. Unknown ids are a no-op returning `None`.
    pub fn remove_issue_by_id(&mut self, id: &str) -> Option<Issue> {
        let issue = self.issues_by_id.remove(id)?;
        let mut ctx = MutationContext::new("remove_issue");

        let neighbors = self.neighbor_ids(id);
        ctx.mark_stale(&neighbors);
        ctx.stale_links.insert(id.to_string());

        self.issues_by_key.remove(&issue.key);
        self.issue_order.remove(id);
        self.issue_column.remove(id);
        self.issues.retain(|other| other != id);

        let removed = self.links.remove_by_source(id);
        ctx.mark_stale(removed.values().map(|link| &link.target_id));
        self.invalidate(&ctx);

        self.updates.add(
            Some(id),
            UpdateKind::Remove,
            UpdatePayload::Removed(RemovedIssue {
                id: issue.id.clone(),
                key: issue.key.clone(),
                repository: issue.repository.clone(),
                links: Vec::new(),
            }),
        );

        debug!(op = ctx.op_name, id = %id, key = %issue.key, links = removed.len(), "Removed issue");
        Some(issue)
    }

    /// Remove an issue by its `owner/repo#number` key.
    pub fn remove_issue_by_key(&mut self, key: &str) -> Option<Issue> {
        let id = self.issues_by_key.get(key)?.clone();
        self.remove_issue_by_id(&id)
    }

    // === Reads ===

    #[must_use]
    pub fn get_issue_by_id(&self, id: &str) -> Option<&Issue> {
        self.issues_by_id.get(id)
    }

    #[must_use]
    pub fn get_issue_by_key(&self, key: &str) -> Option<&Issue> {
        self.issues_by_key
            .get(key)
            .and_then(|id| self.issues_by_id.get(id))
    }

    /// All issues, ascending by order.
    pub fn get_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter_map(|id| self.issues_by_id.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Forward and inverse links of an issue with resolved targets.
    ///
    /// Links whose target is no longer stored are omitted.
    #[must_use]
    pub fn get_issue_links(&self, id: &str) -> Vec<IssueLink> {
        let mut cache = self
            .linked_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(links) = cache.get(id) {
            return links.clone();
        }

        let links: Vec<IssueLink> = self
            .links
            .get_by_source(id)
            .into_values()
            .filter_map(|link| {
                self.issues_by_id.get(&link.target_id).map(|target| IssueLink {
                    link_type: link.link_type,
                    target: target.clone(),
                })
            })
            .collect();

        cache.insert(id.to_string(), links.clone());
        links
    }

    /// Grouped-by-column snapshot, rebuilt lazily after any mutation.
    #[must_use]
    pub fn get_board(&self) -> &Board {
        self.board_cache.get_or_init(|| self.build_board())
    }

    /// Live update entries after `cursor`. `None` or an unknown cursor
    /// replays the full log.
    #[must_use]
    pub fn get_updates(&self, cursor: Option<&str>) -> Vec<UpdateEntry> {
        self.updates.since(cursor).into_iter().cloned().collect()
    }

    /// Cursor clients should save alongside a board snapshot.
    #[must_use]
    pub fn update_head(&self) -> &str {
        self.updates.head_id()
    }

    #[must_use]
    pub const fn update_log(&self) -> &UpdateLog {
        &self.updates
    }

    /// Fractional order between two stored neighbors.
    ///
    /// `before_id` is the issue that should follow, `after_id` the one that
    /// should precede. Unknown ids count as absent.
    #[must_use]
    pub fn compute_order(
        &self,
        before_id: Option<&str>,
        after_id: Option<&str>,
        current: Option<f64>,
    ) -> f64 {
        let before = before_id.and_then(|id| self.issue_order.get(id).copied());
        let after = after_id.and_then(|id| self.issue_order.get(id).copied());
        order::compute_order(before, after, current)
    }

    // === Persistence ===

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            issues: self.get_issues().cloned().collect(),
            issue_order: self
                .issue_order
                .iter()
                .map(|(id, order)| (id.clone(), *order))
                .collect(),
            issue_column: self
                .issue_column
                .iter()
                .map(|(id, column)| (id.clone(), column.clone()))
                .collect(),
            links: self.links.dump(),
        }
    }

    /// Serialize the store to JSON.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Json` if serialization fails.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Replace the store contents with a serialized snapshot.
    ///
    /// The update log is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Json` if the input is not a valid snapshot.
    pub fn restore(&mut self, json: &str) -> Result<()> {
        let snapshot: BoardSnapshot = serde_json::from_str(json)?;
        self.load_snapshot(snapshot);
        Ok(())
    }

    /// Replace the store contents with a snapshot.
    ///
    /// Issues whose recorded column is no longer configured are
    /// reclassified.
    pub fn load_snapshot(&mut self, snapshot: BoardSnapshot) {
        self.issues.clear();
        self.issues_by_id.clear();
        self.issues_by_key.clear();
        self.issue_order.clear();
        self.issue_column.clear();

        for mut issue in snapshot.issues {
            let order = snapshot
                .issue_order
                .get(&issue.id)
                .copied()
                .unwrap_or(issue.order);
            let mut column = snapshot
                .issue_column
                .get(&issue.id)
                .cloned()
                .unwrap_or_else(|| issue.column.clone());
            if !self.columns.contains(&column) {
                trace!(id = %issue.id, column = %column, "Reclassifying issue from unknown column");
                column = self.columns.classify(&issue).to_string();
            }

            issue.order = order;
            issue.column.clone_from(&column);
            self.columns.annotate_labels(&mut issue.labels);

            self.issues.push(issue.id.clone());
            self.issues_by_key.insert(issue.key.clone(), issue.id.clone());
            self.issue_order.insert(issue.id.clone(), order);
            self.issue_column.insert(issue.id.clone(), column);
            self.issues_by_id.insert(issue.id.clone(), issue);
        }

        let issue_order = &self.issue_order;
        self.issues.sort_by(|a, b| {
            let a = issue_order.get(a).copied().unwrap_or(INITIAL_ORDER);
            let b = issue_order.get(b).copied().unwrap_or(INITIAL_ORDER);
            a.total_cmp(&b)
        });

        self.links = LinkGraph::load(snapshot.links);
        self.linked_cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.board_cache.take();

        info!(issues = self.issues.len(), links = self.links.len(), "Restored board");
    }

    // === Internals ===

    /// Replace this issue's forward links with the ones in its text and
    /// record the issues on the other end of every added or removed link.
    fn apply_links(&mut self, issue: &Issue, ctx: &mut MutationContext) {
        let next: BTreeMap<String, Link> = self
            .resolve_links(issue)
            .into_iter()
            .map(|link| (link.key(), link))
            .collect();
        let previous = self.links.get_forward(&issue.id);

        for (key, link) in &previous {
            if !next.contains_key(key) {
                ctx.touch(&link.target_id);
            }
        }
        for (key, link) in &next {
            if !previous.contains_key(key) {
                ctx.touch(&link.target_id);
            }
        }

        // Issues that pointed at us before the rewrite also cache our snapshot.
        let before: Vec<String> = self.neighbor_ids(&issue.id).into_iter().collect();
        ctx.mark_stale(&before);

        self.links.remove_by_source(&issue.id);
        for link in next.into_values() {
            self.links.add_link(link);
        }

        trace!(id = %issue.id, added_or_removed = ctx.touched.len(), "Diffed links");
    }

    /// Resolve text references to stored issues.
    ///
    /// Same-repository references default to the issue's own repository.
    /// References to unknown issues and to the issue itself are skipped.
    fn resolve_links(&self, issue: &Issue) -> Vec<Link> {
        find_links(issue, None)
            .into_iter()
            .filter_map(|parsed| {
                let owner = parsed.owner.as_deref().unwrap_or(&issue.repository.owner);
                let repo = parsed.repo.as_deref().unwrap_or(&issue.repository.name);
                let target_id = self
                    .issues_by_key
                    .get(&issue_key(owner, repo, parsed.number))?;
                if target_id == &issue.id {
                    return None;
                }
                Some(Link::new(issue.id.clone(), target_id.clone(), parsed.link_type))
            })
            .collect()
    }

    fn neighbor_ids(&self, id: &str) -> BTreeSet<String> {
        self.links
            .get_by_source(id)
            .into_values()
            .map(|link| link.target_id)
            .collect()
    }

    /// Order implied by links to issues in the same sorting column.
    ///
    /// Returns `None` when the column does not sort or no linked issue lives
    /// in it.
    fn linked_order(&self, id: &str, column: &str, current: Option<f64>) -> Option<f64> {
        if !self.columns.is_sorting(column) {
            return None;
        }

        let mut after_anchor: Option<(&str, f64)> = None;
        let mut before_anchor: Option<(&str, f64)> = None;

        let links = self.links.get_by_source(id);
        for link in links.values() {
            let Some(placement) = link.link_type.placement() else {
                continue;
            };
            if link.target_id == id
                || self.issue_column.get(&link.target_id).map(String::as_str) != Some(column)
            {
                continue;
            }
            let Some(target_order) = self.issue_order.get(&link.target_id).copied() else {
                continue;
            };
            let target = (link.target_id.as_str(), target_order);

            match placement {
                Placement::After => {
                    if after_anchor.is_none_or(|(_, order)| target_order > order) {
                        after_anchor = Some(target);
                    }
                }
                Placement::Before => {
                    if before_anchor.is_none_or(|(_, order)| target_order < order) {
                        before_anchor = Some(target);
                    }
                }
            }
        }

        let computed = match (after_anchor, before_anchor) {
            (Some((_, after)), Some((_, before))) if after < before => {
                order::compute_order(Some(before), Some(after), current)
            }
            (Some((anchor, after)), _) => {
                let before = self.next_in_column(column, anchor, id);
                order::compute_order(before, Some(after), current)
            }
            (None, Some((anchor, before))) => {
                let after = self.previous_in_column(column, anchor, id);
                order::compute_order(Some(before), after, current)
            }
            (None, None) => return None,
        };

        Some(computed)
    }

    /// Order of the issue directly following `anchor` in `column`, skipping `exclude`.
    fn next_in_column(&self, column: &str, anchor: &str, exclude: &str) -> Option<f64> {
        self.issues
            .iter()
            .skip_while(|id| id.as_str() != anchor)
            .skip(1)
            .find(|id| id.as_str() != exclude && self.in_column(id, column))
            .and_then(|id| self.issue_order.get(id).copied())
    }

    /// Order of the issue directly preceding `anchor` in `column`, skipping `exclude`.
    fn previous_in_column(&self, column: &str, anchor: &str, exclude: &str) -> Option<f64> {
        self.issues
            .iter()
            .rev()
            .skip_while(|id| id.as_str() != anchor)
            .skip(1)
            .find(|id| id.as_str() != exclude && self.in_column(id, column))
            .and_then(|id| self.issue_order.get(id).copied())
    }

    /// Order placing an issue above the first member of `column`.
    fn top_of_column(&self, column: &str, exclude: &str) -> f64 {
        let first = self
            .issues
            .iter()
            .find(|id| id.as_str() != exclude && self.in_column(id, column))
            .and_then(|id| self.issue_order.get(id).copied());
        order::compute_order(first, None, None)
    }

    fn in_column(&self, id: &str, column: &str) -> bool {
        self.issue_column.get(id).map(String::as_str) == Some(column)
    }

    /// Move `id` to the position matching `order`, after any equal orders.
    fn reinsert(&mut self, id: &str, order: f64) {
        if let Some(position) = self.issues.iter().position(|other| other == id) {
            self.issues.remove(position);
        }
        let issue_order = &self.issue_order;
        let position = self.issues.partition_point(|other| {
            issue_order
                .get(other)
                .is_some_and(|other_order| *other_order <= order)
        });
        self.issues.insert(position, id.to_string());
    }

    fn invalidate(&mut self, ctx: &MutationContext) {
        let cache = self
            .linked_cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for id in &ctx.stale_links {
            cache.remove(id);
        }
        self.board_cache.take();
    }

    fn record_update(&mut self, id: &str) {
        let Some(issue) = self.issues_by_id.get(id).cloned() else {
            return;
        };
        let links = self.get_issue_links(id);
        self.updates.add(
            Some(id),
            UpdateKind::Update,
            UpdatePayload::Issue(BoardIssue { issue, links }),
        );
    }

    fn build_board(&self) -> Board {
        let mut columns: Vec<BoardColumn> = self
            .columns
            .names()
            .map(|name| BoardColumn {
                name: name.to_string(),
                issues: Vec::new(),
            })
            .collect();

        for issue in self.get_issues() {
            let Some(column) = columns.iter_mut().find(|column| column.name == issue.column) else {
                continue;
            };
            column.issues.push(BoardIssue {
                issue: issue.clone(),
                links: self.get_issue_links(&issue.id),
            });
        }

        trace!(issues = self.issues.len(), "Rebuilt board cache");
        Board { columns }
    }
}
