//! Configuration for workspaces and simulators.
//!
//! Both configs are plain values with builder-style setters; there is no file
//! or environment layer.

/// Behaviour switches for a [`crate::Workspace`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Log invariant failures at error level through a default subscriber.
    pub log_invariant_errors: bool,
    /// Treat every `past(t)` as already reached.
    pub asynchronous: bool,
    /// Check invariants against the initial state during construction.
    pub check_initial_invariants: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            log_invariant_errors: true,
            asynchronous: false,
            check_initial_invariants: true,
        }
    }
}

impl WorkspaceConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether invariant failures are logged.
    #[must_use]
    pub const fn log_invariant_errors(mut self, enabled: bool) -> Self {
        self.log_invariant_errors = enabled;
        self
    }

    /// Sets asynchronous mode.
    #[must_use]
    pub const fn asynchronous(mut self, enabled: bool) -> Self {
        self.asynchronous = enabled;
        self
    }

    /// Sets whether the initial state is checked against invariants.
    #[must_use]
    pub const fn check_initial_invariants(mut self, enabled: bool) -> Self {
        self.check_initial_invariants = enabled;
        self
    }
}

/// Settings for a [`crate::Simulator`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Seed for the default deterministic RNG.
    pub seed: u64,
    /// Upper bound on clock-advancing passes within a single step.
    ///
    /// `None` means unbounded.
    pub max_passes: Option<usize>,
}

impl SimulatorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bounds the passes a single step may take.
    #[must_use]
    pub const fn with_max_passes(mut self, limit: usize) -> Self {
        self.max_passes = Some(limit);
        self
    }
}
