//! Changesets and readsets: the invalidation primitive.
//!
//! A [`Changeset`] names the variable paths that differ between two states. A
//! [`Readset`] names the paths one evaluation looked at. Every cache in the
//! kernel is invalidated through [`affects`].

use std::collections::BTreeSet;
use std::fmt;

/// Synthetic path published whenever the logical clock moves with a commit or
/// a replay.
pub const CLOCK: &str = "clock";

/// Synthetic path published when only the clock moved and the cursor stayed
/// put.
pub const CLOCK_ADVANCED: &str = "clock:advanced";

/// Synthetic path published whenever the execution history grows.
pub const EXECUTION: &str = "execution";

/// Every synthetic path. No model variable may use one of these names.
pub const MARKERS: [&str; 3] = [CLOCK, CLOCK_ADVANCED, EXECUTION];

// =============================================================================
// Changeset
// =============================================================================

/// Set of changed variable paths, or the wildcard meaning everything changed.
///
/// The wildcard is its own variant so it can never be mixed with explicit
/// paths: once anything is `Everything`, unions stay `Everything`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Changeset {
    /// These exact paths changed. Empty means nothing changed.
    Paths(BTreeSet<String>),
    /// Everything changed.
    Everything,
}

impl Default for Changeset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Changeset {
    /// Creates an empty changeset.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Paths(BTreeSet::new())
    }

    /// Creates the wildcard changeset.
    #[must_use]
    pub const fn everything() -> Self {
        Self::Everything
    }

    /// Creates a changeset from paths.
    pub fn from_paths<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Paths(paths) if paths.is_empty())
    }

    /// Returns true if this is the wildcard.
    #[must_use]
    pub const fn is_everything(&self) -> bool {
        matches!(self, Self::Everything)
    }

    /// Returns true if `path` changed. The wildcard contains every path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        match self {
            Self::Paths(paths) => paths.contains(path),
            Self::Everything => true,
        }
    }

    /// Adds a path. No-op on the wildcard.
    pub fn insert(&mut self, path: impl Into<String>) {
        if let Self::Paths(paths) = self {
            paths.insert(path.into());
        }
    }

    /// Iterates over explicit paths. The wildcard yields nothing.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        let paths = match self {
            Self::Paths(paths) => Some(paths.iter().map(String::as_str)),
            Self::Everything => None,
        };
        paths.into_iter().flatten()
    }

    /// Returns the union of two changesets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        union(self, other)
    }

    /// Returns this changeset with extra paths added.
    #[must_use]
    pub fn with<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
        for path in paths {
            self.insert(path);
        }
        self
    }

    /// Returns true if this changeset invalidates an evaluation that read
    /// `readset`.
    #[must_use]
    pub fn affects(&self, readset: &Readset) -> bool {
        affects(self, readset)
    }
}

impl fmt::Display for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everything => write!(f, "*"),
            Self::Paths(paths) => {
                let joined: Vec<&str> = paths.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

// =============================================================================
// Readset
// =============================================================================

/// Set of paths recorded while one evaluation ran with tracking enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Readset(BTreeSet<String>);

impl Readset {
    /// Creates an empty readset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a read of `path`.
    pub fn record(&mut self, path: impl Into<String>) {
        self.0.insert(path.into());
    }

    /// Returns true if `path` was read.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Returns the number of distinct paths read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the recorded paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Readset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Returns true if `changes` is the wildcard or names any path in `readset`.
#[must_use]
pub fn affects(changes: &Changeset, readset: &Readset) -> bool {
    match changes {
        Changeset::Everything => true,
        Changeset::Paths(paths) => {
            // iterate the smaller side
            if paths.len() <= readset.len() {
                paths.iter().any(|p| readset.contains(p))
            } else {
                readset.iter().any(|r| paths.contains(r))
            }
        }
    }
}

/// Set union of two changesets. The wildcard absorbs.
#[must_use]
pub fn union(a: &Changeset, b: &Changeset) -> Changeset {
    match (a, b) {
        (Changeset::Paths(left), Changeset::Paths(right)) => {
            Changeset::Paths(left.union(right).cloned().collect())
        }
        _ => Changeset::Everything,
    }
}
