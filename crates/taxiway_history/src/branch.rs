//! Branches of the execution tree.
//!
//! A branch names one root-to-tip path through the tree. The first branch is
//! `main`; every later branch forks off an existing event of its parent.

use std::fmt;

use crate::history::EventId;

// =============================================================================
// Branch ID
// =============================================================================

/// Unique identifier for a branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(u64);

impl BranchId {
    /// Creates a new branch ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch-{}", self.0)
    }
}

// =============================================================================
// Branch
// =============================================================================

/// A line of execution through the event tree.
#[derive(Clone, Debug)]
pub struct Branch {
    /// Unique identifier.
    id: BranchId,
    /// Human-readable name.
    name: String,
    /// Branch this one diverged from (None for main).
    parent: Option<BranchId>,
    /// Event this branch diverged at (None for main).
    fork_point: Option<EventId>,
    /// Latest event on this branch.
    tip: EventId,
}

impl Branch {
    pub(crate) fn main(tip: EventId) -> Self {
        Self {
            id: BranchId::new(0),
            name: "main".to_string(),
            parent: None,
            fork_point: None,
            tip,
        }
    }

    pub(crate) fn fork(id: BranchId, parent: BranchId, fork_point: EventId, tip: EventId) -> Self {
        Self {
            id,
            name: id.to_string(),
            parent: Some(parent),
            fork_point: Some(fork_point),
            tip,
        }
    }

    /// Returns the branch ID.
    #[must_use]
    pub const fn id(&self) -> BranchId {
        self.id
    }

    /// Returns the branch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent branch ID.
    #[must_use]
    pub const fn parent(&self) -> Option<BranchId> {
        self.parent
    }

    /// Returns the event this branch forked at.
    #[must_use]
    pub const fn fork_point(&self) -> Option<EventId> {
        self.fork_point
    }

    /// Returns the latest event on this branch.
    #[must_use]
    pub const fn tip(&self) -> EventId {
        self.tip
    }

    pub(crate) fn set_tip(&mut self, tip: EventId) {
        self.tip = tip;
    }
}
