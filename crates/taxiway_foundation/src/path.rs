//! Rendering of variable paths.
//!
//! Paths are the currency shared by changesets and readsets: `x`, `x.field`,
//! `x[2]`, `x[2].field`. [`crate::diff`] and every tracked read render them
//! through this module so the two sides always agree.

use std::fmt;

/// One step into a composite value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A record field.
    Field(String),
    /// A list element.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, ".{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Renders `root` followed by `segments`.
#[must_use]
pub fn render(root: &str, segments: &[PathSegment]) -> String {
    use std::fmt::Write;
    let mut out = root.to_string();
    for segment in segments {
        let _ = write!(out, "{segment}");
    }
    out
}

/// Path of a record field under `parent`.
#[must_use]
pub fn field(parent: &str, name: &str) -> String {
    format!("{parent}.{name}")
}

/// Path of a list element under `parent`.
#[must_use]
pub fn index(parent: &str, i: usize) -> String {
    format!("{parent}[{i}]")
}
