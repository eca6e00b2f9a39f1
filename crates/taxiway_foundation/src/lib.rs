//! Values, errors, changesets, and snapshots for the Taxiway kernel.
//!
//! This crate provides:
//! - [`Value`] - The plain value carried by model variables
//! - [`Error`] - Rich error types with context
//! - [`Changeset`] / [`Readset`] - Changed and read variable paths, and the
//!   [`affects`] invalidation predicate
//! - [`Snapshot`] / [`diff`] - Deep-comparable state and the diff between two states
//! - [`Environment`] - The declared variables of a compiled model

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod changeset;
pub mod env;
pub mod error;
pub mod path;
pub mod snapshot;
pub mod value;

pub use changeset::{
    CLOCK, CLOCK_ADVANCED, Changeset, EXECUTION, MARKERS, Readset, affects, union,
};
pub use env::{Environment, Variable};
pub use error::{Error, ErrorContext, ErrorKind, SemanticLimit};
pub use path::PathSegment;
pub use snapshot::{Snapshot, diff};
pub use value::Value;

/// Logical simulation time, in discrete ticks.
pub type Clock = i64;

/// Result type for Taxiway operations.
pub type Result<T> = std::result::Result<T, Error>;
