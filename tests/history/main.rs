//! Integration tests for Layer 1: History
//!
//! Tests for branching, cursors, and lookups over the execution tree.

mod branching;
