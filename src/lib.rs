//! Taxiway - Reactive execution kernel for rule-based models
//!
//! This crate re-exports all layers of the Taxiway system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: taxiway_engine     — Rules, invariants, workspace, simulator
//! Layer 1: taxiway_history    — Branching execution history, cursors
//! Layer 0: taxiway_foundation — Values, errors, changesets, snapshots
//! ```

pub use taxiway_engine as engine;
pub use taxiway_foundation as foundation;
pub use taxiway_history as history;
