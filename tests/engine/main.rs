//! Integration tests for Layer 2: Engine
//!
//! Tests for rules, quantified rule sets, and invariants driven through a
//! workspace.

mod rules;

use taxiway_engine::WorkspaceConfig;

/// Config that keeps invariant failures out of the test log.
pub fn quiet() -> WorkspaceConfig {
    WorkspaceConfig::new().log_invariant_errors(false)
}
