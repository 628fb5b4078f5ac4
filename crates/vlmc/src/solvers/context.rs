//! Rissanen-style context algorithm.
//!
//! For an internal node `w` the information gain of splitting is
//!
//! ```text
//! delta(w) = Σ_{s : N(s·w) > 0} L(s·w) - L(w),    L(v) = (1/n) Σ_a c_a(v) · ln(c_a(v) / N(v))
//! ```
//!
//! with `n` the root occurrence count. Trimming is bottom-up: a node keeps its
//! children when any child keeps its own; otherwise the node is tested for
//! admissibility and turned into a leaf when it fails.

use crate::error::ConfigError;
use crate::logger::FitLogger;
use crate::tree::{ContextNode, ContextTree};
use crate::vocabulary::SymbolId;

use super::{local_log_likelihood, MethodKind, Pruner};

/// Outcome of the admissibility test for one internal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admissibility {
    /// `depth <= beta · ln(n)`.
    pub length_ok: bool,
    /// Every transition count exceeds `2 · alpha · n / ln(n)`.
    pub count_ok: bool,
    /// `delta > ln(n) / n`.
    pub delta_ok: bool,
    /// Final decision. Ignores `count_ok` unless the count threshold is enforced.
    pub admissible: bool,
}

/// Prunes by empirical information gain.
///
/// # Parameters
///
/// - `alpha`: scale of the minimum transition count, `2 · alpha · n / ln(n)`
/// - `beta`: scale of the maximum context length, `beta · ln(n)`
/// - `enforce_count_threshold`: also require the minimum transition count.
///   Off by default; the length and gain tests alone decide, and a node that
///   only passes because the count test is skipped is reported as a warning.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextAlgorithmSolver {
    pub alpha: f64,
    pub beta: f64,
    pub enforce_count_threshold: bool,
}

impl Default for ContextAlgorithmSolver {
    fn default() -> Self {
        Self {
            alpha: 1.0 / 16.0,
            beta: 1.0,
            enforce_count_threshold: false,
        }
    }
}

impl ContextAlgorithmSolver {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            beta,
            ..Self::default()
        }
    }

    /// Require the minimum transition count as well.
    pub fn with_count_threshold(mut self, enforce: bool) -> Self {
        self.enforce_count_threshold = enforce;
        self
    }

    /// Information gain of splitting `node`, or `None` at a leaf.
    ///
    /// `n` is the normalizer, the root occurrence count during a fit.
    pub fn delta(node: &ContextNode, n: u64) -> Option<f64> {
        let children = node.children()?;
        let n = n as f64;
        let parent = local_log_likelihood(node) / n;
        let split: f64 = children
            .values()
            .filter(|child| child.occurrence_count() > 0)
            .map(|child| local_log_likelihood(child) / n)
            .sum();
        Some(split - parent)
    }

    /// Admissibility of a node at `depth` with `transition_counts` and gain `delta`.
    pub fn is_admissible(
        &self,
        depth: usize,
        transition_counts: &[u64],
        delta: f64,
        n: u64,
    ) -> Admissibility {
        let n = n as f64;
        let ln_n = n.ln();
        let length_ok = (depth as f64) <= self.beta * ln_n;
        let count_ok = transition_counts
            .iter()
            .min()
            .is_some_and(|&c| (c as f64) > self.count_threshold(n));
        let delta_ok = delta > ln_n / n;
        let admissible =
            length_ok && delta_ok && (count_ok || !self.enforce_count_threshold);
        Admissibility {
            length_ok,
            count_ok,
            delta_ok,
            admissible,
        }
    }

    /// Minimum transition count `2 · alpha · n / ln(n)`.
    #[inline]
    pub fn count_threshold(&self, n: f64) -> f64 {
        2.0 * self.alpha * n / n.ln()
    }

    /// Returns whether `node` keeps its subtree.
    ///
    /// Nodes kept only because the count threshold is not enforced are
    /// pushed to `unenforced`.
    fn trim(
        &self,
        node: &mut ContextNode,
        n: u64,
        unenforced: &mut Vec<UnenforcedCount>,
    ) -> bool {
        let Some(children) = node.children_mut() else {
            return false;
        };
        // every child is trimmed, no short-circuit
        let keep_children = children
            .values_mut()
            .map(|child| self.trim(child, n, unenforced))
            .fold(false, |acc, keep| acc | keep);
        if keep_children {
            return true;
        }

        let delta = Self::delta(node, n).unwrap_or(f64::NAN);
        let verdict = self.is_admissible(node.depth(), node.transition_counts(), delta, n);
        if !verdict.admissible {
            node.prune();
            return false;
        }
        if !verdict.count_ok {
            unenforced.push(UnenforcedCount {
                context: node.context().to_vec(),
                min_count: node.transition_counts().iter().copied().min().unwrap_or(0),
            });
        }
        true
    }
}

/// A kept context with a transition count below the count threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
struct UnenforcedCount {
    context: Vec<SymbolId>,
    min_count: u64,
}

impl Pruner for ContextAlgorithmSolver {
    fn kind(&self) -> MethodKind {
        MethodKind::ContextAlgorithm
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.alpha <= 0.0 || !self.alpha.is_finite() {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.beta <= 0.0 || !self.beta.is_finite() {
            return Err(ConfigError::InvalidBeta {
                method: MethodKind::ContextAlgorithm,
                range: "(0, inf)",
                value: self.beta,
            });
        }
        Ok(())
    }

    fn prune(&self, tree: &mut ContextTree, _sample: &[SymbolId], logger: &FitLogger) {
        let n = tree.root().occurrence_count();
        let mut unenforced = Vec::new();
        self.trim(tree.root_mut(), n, &mut unenforced);

        let threshold = self.count_threshold(n as f64);
        for kept in &unenforced {
            logger.log_unenforced_count_threshold(
                &tree.vocabulary().render(&kept.context),
                kept.min_count,
                threshold,
            );
        }
    }
}
