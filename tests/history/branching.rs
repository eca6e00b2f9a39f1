//! Branching history tests

use taxiway_foundation::{Changeset, Clock, Snapshot, Value};
use taxiway_history::{BranchId, ExecutionEvent, History};

fn event(clock: Clock, x: i64) -> ExecutionEvent {
    let snapshot: Snapshot = [("x", Value::Int(x))].into_iter().collect();
    ExecutionEvent::new(format!("x = {x}"), snapshot, clock, Changeset::from_paths(["x"]))
}

// =============================================================================
// Forks
// =============================================================================

#[test]
fn forks_from_the_same_event_get_distinct_branches() {
    let mut history = History::new(event(0, 0));
    let root = history.root();
    let tip = history.append(&root, event(0, 1)).unwrap();
    let first = history.append(&root, event(0, 2)).unwrap();
    let second = history.append(&root, event(0, 3)).unwrap();

    assert_eq!(tip.branch(), BranchId::new(0));
    assert_ne!(first.branch(), second.branch());
    assert_eq!(history.children(root.event()).len(), 3);
    assert_eq!(history.branches().count(), 3);
}

#[test]
fn fork_branch_is_named_after_its_id() {
    let mut history = History::new(event(0, 0));
    let root = history.root();
    history.append(&root, event(0, 1)).unwrap();
    let forked = history.append(&root, event(0, 2)).unwrap();
    let branch = history.branch(forked.branch()).unwrap();
    assert!(history.branch_by_name(branch.name()).is_some());
    assert_eq!(history.branch_by_name("main").unwrap().id(), BranchId::new(0));
}

#[test]
fn extending_a_fork_tip_does_not_fork_again() {
    let mut history = History::new(event(0, 0));
    let root = history.root();
    history.append(&root, event(0, 1)).unwrap();
    let forked = history.append(&root, event(0, 2)).unwrap();
    let extended = history.append(&forked, event(1, 3)).unwrap();
    assert_eq!(extended.branch(), forked.branch());
    assert_eq!(history.branches().count(), 2);
}

// =============================================================================
// Lookups
// =============================================================================

#[test]
fn preceding_respects_branch() {
    let mut history = History::new(event(0, 0));
    let mut main = history.root();
    for clock in 1..=4 {
        main = history.append(&main, event(clock, clock)).unwrap();
    }
    let early = history.preceding(main.branch(), |e| e.clock() <= 1).unwrap();
    let forked = history.append(&early, event(2, 100)).unwrap();

    let on_fork = history.preceding(forked.branch(), |e| e.clock() <= 3).unwrap();
    assert_eq!(
        history.at(&on_fork).unwrap().snapshot().get("x"),
        Some(&Value::Int(100))
    );
    let on_main = history.preceding(main.branch(), |e| e.clock() <= 3).unwrap();
    assert_eq!(
        history.at(&on_main).unwrap().snapshot().get("x"),
        Some(&Value::Int(3))
    );
}

#[test]
fn contains_checks_branch_membership() {
    let mut history = History::new(event(0, 0));
    let root = history.root();
    let main_tip = history.append(&root, event(0, 1)).unwrap();
    let forked = history.append(&root, event(0, 2)).unwrap();

    assert!(history.contains(&main_tip));
    assert!(history.contains(&forked));
    let crossed = taxiway_history::Cursor::new(main_tip.event(), forked.branch());
    assert!(!history.contains(&crossed));
}

#[test]
fn lineage_walks_to_root() {
    let mut history = History::new(event(0, 0));
    let mut cursor = history.root();
    for clock in 1..=3 {
        cursor = history.append(&cursor, event(clock, clock)).unwrap();
    }
    assert_eq!(history.lineage(cursor.event()).count(), 4);
    assert_eq!(history.path(cursor.branch()).first(), Some(&history.root().event()));
}
