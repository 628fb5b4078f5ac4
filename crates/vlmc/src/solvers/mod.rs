//! Pruning solvers.
//!
//! A solver scores every node of a counted [`ContextTree`] and prunes the
//! shape in place. Scores live in a [`ScoreTree`] that mirrors the tree for
//! the duration of one run; nothing is stored on the nodes.
//!
//! # Available Solvers
//!
//! - [`BicSolver`]: penalized log-likelihood with top-down `chi` gating
//! - [`ContextAlgorithmSolver`]: empirical information gain with length and
//!   frequency admissibility thresholds
//! - [`BctSolver`]: Bayesian context-tree mixture of KT estimators
//!
//! [`PruningMethod`] wraps the three for configuration and dispatches once per
//! fit.

mod bct;
mod bic;
mod context;

pub use bct::{kt_log_estimate, BctScore, BctSolver};
pub use bic::{BicScore, BicSolver};
pub use context::{Admissibility, ContextAlgorithmSolver};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, VlmcError};
use crate::logger::FitLogger;
use crate::tree::{ContextNode, ContextTree};
use crate::vocabulary::SymbolId;

// =============================================================================
// Pruner Trait
// =============================================================================

/// A model-selection criterion that prunes a counted context tree.
pub trait Pruner: Send + Sync {
    /// Which criterion this is.
    fn kind(&self) -> MethodKind;

    /// Check the criterion's parameters.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Prune `tree` in place. Counts must already be attached.
    ///
    /// `sample` is the encoded sample the tree was counted on.
    fn prune(&self, tree: &mut ContextTree, sample: &[SymbolId], logger: &FitLogger);

    /// Check parameters and the counted precondition, prune, and log the result.
    ///
    /// # Errors
    ///
    /// - [`VlmcError::Config`] if the parameters are out of range
    /// - [`VlmcError::NotCounted`] if the tree carries no counts
    fn apply(
        &self,
        tree: &mut ContextTree,
        sample: &[SymbolId],
        logger: &FitLogger,
    ) -> Result<(), VlmcError> {
        self.validate()?;
        if !tree.root().is_counted() {
            return Err(VlmcError::NotCounted);
        }
        let leaves_before = tree.n_leaves();
        self.prune(tree, sample, logger);
        logger.log_pruning(self.kind(), leaves_before, tree.n_leaves());
        Ok(())
    }
}

// =============================================================================
// MethodKind
// =============================================================================

/// Tag of a pruning criterion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Bic,
    ContextAlgorithm,
    Bct,
}

impl MethodKind {
    /// Short name, as accepted by [`PruningMethod::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Bic => "bic",
            Self::ContextAlgorithm => "context",
            Self::Bct => "bct",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PruningMethod (Convenience wrapper)
// =============================================================================

/// Pruning criterion enum for configuration.
///
/// Each variant carries its solver with its parameters. Parse from
/// `"bic"`, `"context"` or `"bct"` to get default parameters.
///
/// # Example
///
/// ```
/// use vlmc::PruningMethod;
///
/// let method: PruningMethod = "bct".parse().unwrap();
/// assert_eq!(method, PruningMethod::bct(0.5));
/// assert!("aic".parse::<PruningMethod>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum PruningMethod {
    Bic(BicSolver),
    ContextAlgorithm(ContextAlgorithmSolver),
    Bct(BctSolver),
}

impl PruningMethod {
    /// BIC-penalized likelihood.
    pub fn bic() -> Self {
        Self::Bic(BicSolver)
    }

    /// Context algorithm with default thresholds (`alpha = 1/16`, `beta = 1`).
    pub fn context_algorithm() -> Self {
        Self::ContextAlgorithm(ContextAlgorithmSolver::default())
    }

    /// Bayesian context-tree mixture with prior weight `beta` on stopping.
    pub fn bct(beta: f64) -> Self {
        Self::Bct(BctSolver::new(beta))
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Self::Bic(inner) => inner.kind(),
            Self::ContextAlgorithm(inner) => inner.kind(),
            Self::Bct(inner) => inner.kind(),
        }
    }
}

impl Default for PruningMethod {
    fn default() -> Self {
        Self::bic()
    }
}

impl FromStr for PruningMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bic" => Ok(Self::bic()),
            "context" => Ok(Self::context_algorithm()),
            "bct" => Ok(Self::Bct(BctSolver::default())),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

impl Pruner for PruningMethod {
    fn kind(&self) -> MethodKind {
        PruningMethod::kind(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Bic(inner) => inner.validate(),
            Self::ContextAlgorithm(inner) => inner.validate(),
            Self::Bct(inner) => inner.validate(),
        }
    }

    fn prune(&self, tree: &mut ContextTree, sample: &[SymbolId], logger: &FitLogger) {
        match self {
            Self::Bic(inner) => inner.prune(tree, sample, logger),
            Self::ContextAlgorithm(inner) => inner.prune(tree, sample, logger),
            Self::Bct(inner) => inner.prune(tree, sample, logger),
        }
    }
}

// =============================================================================
// ScoreTree
// =============================================================================

/// Per-node solver values, mirroring the shape of a context tree.
///
/// Keys follow the tree: a child keyed by `s` scores the context `s·w`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTree<T> {
    pub value: T,
    pub children: BTreeMap<SymbolId, ScoreTree<T>>,
}

impl<T> ScoreTree<T> {
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: BTreeMap::new(),
        }
    }

    /// Scores of the node holding `context` (oldest symbol first).
    pub fn get(&self, context: &[SymbolId]) -> Option<&ScoreTree<T>> {
        context
            .iter()
            .rev()
            .try_fold(self, |score, s| score.children.get(s))
    }

    /// Score `node` and its subtree bottom-up: `f` sees the node and the
    /// already computed scores of its children.
    pub(crate) fn build<F>(node: &ContextNode, f: &F) -> Self
    where
        F: Fn(&ContextNode, &BTreeMap<SymbolId, ScoreTree<T>>) -> T,
    {
        let children: BTreeMap<SymbolId, ScoreTree<T>> = node
            .children()
            .map(|children| {
                children
                    .iter()
                    .map(|(&s, child)| (s, Self::build(child, f)))
                    .collect()
            })
            .unwrap_or_default();
        let value = f(node, &children);
        Self { value, children }
    }
}

// =============================================================================
// Shared likelihood
// =============================================================================

/// Maximized log-likelihood of the transitions out of `node`:
/// `Σ c_s · ln(c_s / N)` over symbols with `c_s ≥ 1`.
///
/// A node that never occurred contributes 0.
pub fn local_log_likelihood(node: &ContextNode) -> f64 {
    let n = node.occurrence_count();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    node.transition_counts()
        .iter()
        .filter(|&&c| c >= 1)
        .map(|&c| {
            let c = c as f64;
            c * (c / n).ln()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::SampleCounter;
    use crate::{Parallelism, Vocabulary};

    #[test]
    fn parses_method_names() {
        assert_eq!("bic".parse::<PruningMethod>().unwrap().kind(), MethodKind::Bic);
        assert_eq!(
            " Context ".parse::<PruningMethod>().unwrap().kind(),
            MethodKind::ContextAlgorithm
        );
        assert_eq!("bct".parse::<PruningMethod>().unwrap(), PruningMethod::bct(0.5));
        assert_eq!(
            "mdl".parse::<PruningMethod>(),
            Err(ConfigError::UnknownMethod("mdl".into()))
        );
    }

    #[test]
    fn method_kind_display_round_trips_through_parse() {
        for kind in [MethodKind::Bic, MethodKind::ContextAlgorithm, MethodKind::Bct] {
            let parsed: PruningMethod = kind.to_string().parse().unwrap();
            assert_eq!(parsed.kind(), kind);
        }
    }

    #[test]
    fn apply_requires_counts() {
        let mut tree = ContextTree::new(2, Vocabulary::new(["a", "b"]).unwrap()).unwrap();
        let logger = FitLogger::new(crate::Verbosity::Silent);
        let err = PruningMethod::bic().apply(&mut tree, &[0, 1], &logger);
        assert!(matches!(err, Err(VlmcError::NotCounted)));
    }

    #[test]
    fn apply_rejects_out_of_range_parameters() {
        let vocab = Vocabulary::new(["a", "b"]).unwrap();
        let sample: Vec<SymbolId> = (0..100).map(|i| (i % 2) as SymbolId).collect();
        let mut tree = ContextTree::new(2, vocab).unwrap();
        SampleCounter::new(false)
            .fit(&mut tree, &sample, Parallelism::Sequential)
            .unwrap();
        let logger = FitLogger::new(crate::Verbosity::Silent);

        let err = PruningMethod::bct(1.5).apply(&mut tree, &sample, &logger);
        assert!(matches!(
            err,
            Err(VlmcError::Config(ConfigError::InvalidBeta {
                method: MethodKind::Bct,
                ..
            }))
        ));
        let err = PruningMethod::ContextAlgorithm(ContextAlgorithmSolver::new(0.0, 1.0))
            .apply(&mut tree, &sample, &logger);
        assert!(matches!(
            err,
            Err(VlmcError::Config(ConfigError::InvalidAlpha(_)))
        ));
        // rejected before pruning: the tree keeps its split
        assert!(!tree.root().is_leaf());

        PruningMethod::bct(0.5).apply(&mut tree, &sample, &logger).unwrap();
        assert!(!tree.root().is_leaf());
    }

    #[test]
    fn score_tree_mirrors_shape() {
        let mut tree = ContextTree::new(2, Vocabulary::new(["a", "b"]).unwrap()).unwrap();
        SampleCounter::new(false)
            .fit(&mut tree, &[0, 1, 1, 0, 1, 0], Parallelism::Sequential)
            .unwrap();
        let scores = ScoreTree::build(tree.root(), &|node: &ContextNode, _: &BTreeMap<_, _>| {
            node.depth()
        });
        assert_eq!(scores.value, 0);
        assert_eq!(scores.get(&[1, 0]).map(|s| s.value), Some(2));
        assert_eq!(scores.children.len(), 2);
    }

    #[test]
    fn local_log_likelihood_of_deterministic_context_is_zero() {
        let mut tree = ContextTree::new(1, Vocabulary::new(["a", "b"]).unwrap()).unwrap();
        // "a" is always followed by "b"
        SampleCounter::new(false)
            .fit(&mut tree, &[0, 1, 0, 1, 1], Parallelism::Sequential)
            .unwrap();
        assert_eq!(local_log_likelihood(tree.node(&[0]).unwrap()), 0.0);
        let b = local_log_likelihood(tree.node(&[1]).unwrap());
        assert!((b - 2.0 * 0.5f64.ln()).abs() < 1e-12);
    }
}
