//! Branching execution history and time travel for Taxiway.
//!
//! This crate provides:
//! - [`ExecutionEvent`] - An immutable record of one committed state
//! - [`History`] - Append-only arena of events forming a tree
//! - [`Cursor`] - A position in that tree, viewed along one [`Branch`]
//!
//! # Shape
//!
//! ```text
//! #0 ── #1 ── #2 ── #3        main
//!        └─── #4 ── #5        branch-1 (forked at #1)
//! ```
//!
//! Appending at a branch tip grows the branch. Appending anywhere else forks a
//! new branch; nothing already recorded is ever rewritten.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod branch;
pub mod event;
pub mod history;

pub use branch::{Branch, BranchId};
pub use event::ExecutionEvent;
pub use history::{Cursor, EventId, History};
