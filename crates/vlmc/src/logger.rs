//! Verbosity-gated fit logging.
//!
//! [`FitLogger`] reports each phase of a fit (truncation, counting,
//! admissibility, pruning) as `tracing` events. Nothing is emitted unless the
//! configured [`Verbosity`] admits the event's level, and the library never
//! installs a subscriber itself.

use std::time::Instant;

use crate::solvers::MethodKind;

/// Verbosity level for fit output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Only unusual conditions (degenerate samples, ignored thresholds).
    Warning,
    /// One line per fit phase.
    Info,
    /// Per-phase statistics.
    Debug,
}

/// Summary of the admissibility reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdmissibilityStats {
    /// Contexts removed because they never occurred (subtree roots only).
    pub removed: usize,
    /// Internal nodes collapsed into leaves because a single child survived.
    pub collapsed: usize,
    /// Depth of the deepest leaf after reduction.
    pub max_depth: usize,
    /// Number of sample windows checked for context association.
    pub windows: usize,
}

/// Phase logger for a single fit.
#[derive(Debug)]
pub struct FitLogger {
    verbosity: Verbosity,
    start: Instant,
}

impl FitLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn log_start(&self, n_samples: usize, n_symbols: usize, max_order: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(n_samples, n_symbols, max_order, "fitting context tree");
        }
    }

    pub fn log_truncation(&self, from: usize, to: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(from, to, "truncated tree depth to the sample-size bound");
        }
    }

    pub fn log_leaf_counts(&self, n_leaves: usize, total: u64) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(n_leaves, total, "counted leaf contexts");
        }
    }

    pub fn log_admissibility(&self, stats: &AdmissibilityStats) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                removed = stats.removed,
                collapsed = stats.collapsed,
                max_depth = stats.max_depth,
                windows = stats.windows,
                "admissibility reduction done"
            );
        }
    }

    pub fn log_transitions(&self, n_nodes: usize) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(n_nodes, "attached transition counts");
        }
    }

    pub fn log_unenforced_count_threshold(&self, context: &str, min_count: u64, threshold: f64) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!(
                context,
                min_count,
                threshold,
                "context kept although a transition count is below the count threshold"
            );
        }
    }

    pub fn log_pruning(&self, method: MethodKind, leaves_before: usize, leaves_after: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                %method,
                leaves_before,
                leaves_after,
                "pruned context tree"
            );
        }
    }

    pub fn finish(&self, n_leaves: usize, depth: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                n_leaves,
                depth,
                elapsed_ms = self.start.elapsed().as_millis() as u64,
                "fit finished"
            );
        }
    }
}
