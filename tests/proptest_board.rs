//! Property-based tests for ordering, classification, links and the
//! update log.

mod common;

use proptest::prelude::*;
use tracing::info;

use common::fixtures::PatchBuilder;
use common::init_test_logging;
use issue_board::columns::Columns;
use issue_board::model::{Label, Link, LinkType, UpdateKind, UpdatePayload, RemovedIssue};
use issue_board::storage::{BoardStore, LinkGraph, UpdateLog, compute_order};

const LABELS: [&str; 6] = ["backlog", "ready", "in progress", "needs review", "bug", "docs"];

fn label_set() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(LABELS.to_vec(), 0..=LABELS.len())
}

fn placeholder(id: &str) -> UpdatePayload {
    UpdatePayload::Removed(RemovedIssue {
        id: id.to_string(),
        key: format!("x/y#{id}"),
        repository: common::fixtures::default_repo(),
        links: Vec::new(),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn insertions_before_head_stay_strictly_descending(start in -1.0e12_f64..1.0e12) {
        init_test_logging();
        let mut head = start;
        for step in 0..1_000 {
            let next = compute_order(Some(head), None, None);
            prop_assert!(next < head, "collision at step {step}: {next} !< {head}");
            head = next;
        }
    }

    #[test]
    fn insertions_between_neighbors_stay_between(low in -1.0e6_f64..0.0, high in 1.0_f64..1.0e6, steps in 1usize..40) {
        let mut after = low;
        for _ in 0..steps {
            let mid = compute_order(Some(high), Some(after), None);
            prop_assert!(after < mid && mid < high);
            after = mid;
        }
    }

    #[test]
    fn classification_is_idempotent(labels in label_set(), closed in any::<bool>()) {
        init_test_logging();
        let mut builder = PatchBuilder::new(1).labels(&labels);
        if closed {
            builder = builder.closed();
        }
        let mut store = BoardStore::with_update_log(Columns::default(), UpdateLog::with_start(0));
        let first = store.update_issue(builder.build(), None, None).unwrap();

        let columns = Columns::default();
        prop_assert_eq!(columns.classify(&first), first.column.as_str());
        prop_assert_eq!(columns.classify(&first), columns.classify(&first));

        let again = store
            .update_issue(PatchBuilder::new(1).title("touch").build(), None, None)
            .unwrap();
        prop_assert_eq!(&again.column, &first.column);
        prop_assert!((again.order - first.order).abs() < f64::EPSILON);
    }

    #[test]
    fn column_labels_are_flagged(labels in label_set()) {
        let mut labels: Vec<Label> = labels.into_iter().map(Label::new).collect();
        Columns::default().annotate_labels(&mut labels);
        for label in &labels {
            let expected = !matches!(label.name.as_str(), "bug" | "docs");
            prop_assert_eq!(label.column_label, expected);
        }
    }

    #[test]
    fn links_stay_symmetric(edges in proptest::collection::vec((0u8..6, 0u8..6, 0usize..8), 0..30)) {
        let mut graph = LinkGraph::new();
        for (source, target, kind) in &edges {
            if source == target {
                continue;
            }
            graph.add_link(Link::new(source.to_string(), target.to_string(), LinkType::ALL[*kind]));
        }

        for source in 0u8..6 {
            let source = source.to_string();
            for link in graph.get_forward(&source).values() {
                let Some(inverse) = link.link_type.inverse() else {
                    continue;
                };
                let back = graph.get_by_source(&link.target_id);
                prop_assert!(
                    back.values().any(|l| l.target_id == source && l.link_type == inverse),
                    "missing {inverse} from {} to {source}", link.target_id
                );
            }
        }

        for source in 0u8..6 {
            graph.remove_by_source(&source.to_string());
        }
        prop_assert!(graph.is_empty());
    }

    #[test]
    fn update_log_keeps_latest_per_key(keys in proptest::collection::vec(0u8..5, 1..60)) {
        let mut log = UpdateLog::with_start(0);
        let initial = log.head_id().to_string();
        for key in &keys {
            log.add(Some(&key.to_string()), UpdateKind::Remove, placeholder(&key.to_string()));
        }

        let live = log.since(Some(&initial));
        let mut distinct: Vec<u8> = keys.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(live.len(), distinct.len());

        // Each survivor is the last add for its key.
        for entry in live {
            let key: u8 = entry.issue.id().parse().unwrap();
            let last = keys.iter().rposition(|k| *k == key).unwrap();
            prop_assert_eq!(entry.id.parse::<usize>().unwrap(), last + 1);
        }
    }
}

#[test]
fn repeated_updates_compact_to_one_entry() {
    init_test_logging();
    let mut store = BoardStore::with_update_log(Columns::default(), UpdateLog::with_start(0));
    let initial = store.update_head().to_string();

    for round in 0..25 {
        store
            .update_issue(PatchBuilder::new(1).title(&format!("v{round}")).build(), None, None)
            .unwrap();
    }

    let updates = store.get_updates(Some(&initial));
    info!(entries = store.update_log().len(), "compaction check");
    assert_eq!(updates.len(), 1);
    let UpdatePayload::Issue(latest) = &updates[0].issue else {
        panic!("expected issue payload");
    };
    assert_eq!(latest.issue.title, "v24");
}
