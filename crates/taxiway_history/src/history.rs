//! The execution tree.
//!
//! Events live in an append-only arena and are addressed by stable
//! [`EventId`]s. Each node records its parent and its ordered children, so the
//! tree has no ownership cycles and a [`Cursor`] is just an index plus the
//! branch it is looking along.
//!
//! Every node knows its depth and every branch keeps its root-to-tip path,
//! so membership and successor lookups along a branch are constant time.

use std::fmt;
use std::hash::{Hash, Hasher};

use taxiway_foundation::{Error, Result};

use crate::branch::{Branch, BranchId};
use crate::event::ExecutionEvent;

// =============================================================================
// Event ID
// =============================================================================

/// Stable index of an event in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    /// Creates an event ID from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// A position in the execution tree, viewed along one branch.
///
/// Two cursors are equal when they point at the same event, regardless of the
/// branch they were obtained from.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    event: EventId,
    branch: BranchId,
}

impl Cursor {
    /// Creates a cursor.
    #[must_use]
    pub const fn new(event: EventId, branch: BranchId) -> Self {
        Self { event, branch }
    }

    /// Returns the event this cursor points at.
    #[must_use]
    pub const fn event(&self) -> EventId {
        self.event
    }

    /// Returns the branch this cursor moves along.
    #[must_use]
    pub const fn branch(&self) -> BranchId {
        self.branch
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event
    }
}

impl Eq for Cursor {}

impl Hash for Cursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.event.hash(state);
    }
}

// =============================================================================
// History
// =============================================================================

#[derive(Clone, Debug)]
struct Node {
    event: ExecutionEvent,
    parent: Option<EventId>,
    children: Vec<EventId>,
    depth: usize,
}

/// Append-only, branchable tree of committed states.
#[derive(Clone, Debug)]
pub struct History {
    nodes: Vec<Node>,
    branches: Vec<Branch>,
    // Root-to-tip events of each branch, indexed like `branches`.
    paths: Vec<Vec<EventId>>,
}

impl History {
    /// Creates a history holding only `initial` on the `main` branch.
    #[must_use]
    pub fn new(initial: ExecutionEvent) -> Self {
        let root = EventId::new(0);
        Self {
            nodes: vec![Node {
                event: initial,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
            branches: vec![Branch::main(root)],
            paths: vec![vec![root]],
        }
    }

    /// Returns a cursor at the initial event on `main`.
    #[must_use]
    pub fn root(&self) -> Cursor {
        Cursor::new(EventId::new(0), BranchId::new(0))
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a history holds at least its initial event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an event by ID.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&ExecutionEvent> {
        self.nodes.get(id.index()).map(|node| &node.event)
    }

    /// Returns the event a cursor points at.
    ///
    /// # Errors
    /// Returns an internal error if the cursor does not belong to this history.
    pub fn at(&self, cursor: &Cursor) -> Result<&ExecutionEvent> {
        self.event(cursor.event)
            .ok_or_else(|| Error::internal(format!("no event {} in history", cursor.event)))
    }

    /// Returns an event's parent.
    #[must_use]
    pub fn parent(&self, id: EventId) -> Option<EventId> {
        self.nodes.get(id.index()).and_then(|node| node.parent)
    }

    /// Returns an event's children in the order they were appended.
    #[must_use]
    pub fn children(&self, id: EventId) -> &[EventId] {
        self.nodes
            .get(id.index())
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// Iterates from `id` back to the root, inclusive.
    pub fn lineage(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        let start = (id.index() < self.nodes.len()).then_some(id);
        std::iter::successors(start, move |&current| self.parent(current))
    }

    /// Returns a branch by ID.
    #[must_use]
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(id.index())
    }

    /// Returns a branch by name.
    #[must_use]
    pub fn branch_by_name(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.name() == name)
    }

    /// Iterates over branches in creation order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    /// Returns a cursor at the tip of a branch.
    #[must_use]
    pub fn tip(&self, branch: BranchId) -> Option<Cursor> {
        self.branch(branch)
            .map(|b| Cursor::new(b.tip(), branch))
    }

    /// Returns the events of a branch from the root to its tip.
    #[must_use]
    pub fn path(&self, branch: BranchId) -> Vec<EventId> {
        self.branch_path(branch).to_vec()
    }

    fn branch_path(&self, branch: BranchId) -> &[EventId] {
        self.paths.get(branch.index()).map_or(&[][..], Vec::as_slice)
    }

    fn depth(&self, id: EventId) -> Option<usize> {
        self.nodes.get(id.index()).map(|node| node.depth)
    }

    /// Returns true if the cursor's event lies on the cursor's branch.
    #[must_use]
    pub fn contains(&self, cursor: &Cursor) -> bool {
        self.depth(cursor.event).is_some_and(|depth| {
            self.branch_path(cursor.branch).get(depth) == Some(&cursor.event)
        })
    }

    /// Returns true if the cursor is at the tip of its branch.
    #[must_use]
    pub fn is_tip(&self, cursor: &Cursor) -> bool {
        self.branch(cursor.branch)
            .is_some_and(|b| b.tip() == cursor.event)
    }

    /// Appends an event after the cursor.
    ///
    /// At the tip of its branch the branch simply grows. Anywhere else a new
    /// branch forks off at the cursor's event. The returned cursor's branch
    /// differs from `at`'s exactly when a fork happened.
    ///
    /// # Errors
    /// Returns an internal error if the cursor is not on its branch.
    pub fn append(&mut self, at: &Cursor, event: ExecutionEvent) -> Result<Cursor> {
        if !self.contains(at) {
            return Err(Error::internal(format!(
                "cannot append at {} on {}",
                at.event, at.branch
            )));
        }
        let id = EventId::new(self.nodes.len());
        let depth = self.nodes[at.event.index()].depth + 1;
        self.nodes.push(Node {
            event,
            parent: Some(at.event),
            children: Vec::new(),
            depth,
        });
        self.nodes[at.event.index()].children.push(id);

        if self.is_tip(at) {
            self.branches[at.branch.index()].set_tip(id);
            self.paths[at.branch.index()].push(id);
            return Ok(Cursor::new(id, at.branch));
        }
        let branch = BranchId::new(self.branches.len() as u64);
        let mut path = self.paths[at.branch.index()][..depth].to_vec();
        path.push(id);
        self.branches
            .push(Branch::fork(branch, at.branch, at.event, id));
        self.paths.push(path);
        Ok(Cursor::new(id, branch))
    }

    /// Returns the cursor's successor along its branch.
    #[must_use]
    pub fn next(&self, cursor: &Cursor) -> Option<Cursor> {
        if !self.contains(cursor) {
            return None;
        }
        let depth = self.depth(cursor.event)?;
        self.branch_path(cursor.branch)
            .get(depth + 1)
            .map(|&id| Cursor::new(id, cursor.branch))
    }

    /// Returns the latest event on a branch satisfying `predicate`, searching
    /// back from the tip.
    pub fn preceding<P>(&self, branch: BranchId, mut predicate: P) -> Option<Cursor>
    where
        P: FnMut(&ExecutionEvent) -> bool,
    {
        self.branch_path(branch)
            .iter()
            .rev()
            .find(|&&id| predicate(&self.nodes[id.index()].event))
            .map(|&id| Cursor::new(id, branch))
    }

    /// Records the invariant outcome of an event.
    ///
    /// # Errors
    /// Returns an internal error if the event does not exist.
    pub fn set_passed_invariants(&mut self, id: EventId, passed: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::internal(format!("no event {id} in history")))?;
        node.event.set_passed_invariants(passed);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
