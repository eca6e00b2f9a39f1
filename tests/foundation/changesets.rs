//! Changeset and readset tests

use taxiway_foundation::{CLOCK, Changeset, EXECUTION, Readset, affects, union};

// =============================================================================
// Affects
// =============================================================================

#[test]
fn empty_changes_affect_nothing() {
    let readset: Readset = ["x", "y"].into_iter().collect();
    assert!(!affects(&Changeset::empty(), &readset));
}

#[test]
fn everything_affects_even_empty_readset() {
    assert!(affects(&Changeset::everything(), &Readset::new()));
}

#[test]
fn overlap_is_exact_path_match() {
    let readset: Readset = ["lift[1].at"].into_iter().collect();
    assert!(affects(&Changeset::from_paths(["lift[1].at"]), &readset));
    assert!(!affects(&Changeset::from_paths(["lift[0].at"]), &readset));
}

// =============================================================================
// Union
// =============================================================================

#[test]
fn union_merges_paths() {
    let merged = union(
        &Changeset::from_paths(["x"]),
        &Changeset::from_paths([CLOCK, EXECUTION]),
    );
    assert_eq!(merged, Changeset::from_paths(["x", CLOCK, EXECUTION]));
}

#[test]
fn union_with_everything_is_everything() {
    let merged = union(&Changeset::from_paths(["x"]), &Changeset::everything());
    assert!(merged.is_everything());
}

#[test]
fn display_lists_paths_in_order() {
    let changes = Changeset::from_paths(["y", "x"]);
    assert_eq!(changes.to_string(), "x, y");
}
