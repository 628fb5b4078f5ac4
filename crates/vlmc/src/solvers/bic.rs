//! BIC-penalized likelihood pruning.
//!
//! Every node gets a value `V`: at a leaf, its own penalized log-likelihood;
//! at an internal node, the larger of its own penalized log-likelihood and the
//! sum of its children's `V`. `chi` records whether the children won.
//!
//! Pruning walks down from the root through `chi = 1` nodes only and turns
//! the first `chi = 0` node on every path into a leaf. A shallow node that
//! prefers to stop therefore removes everything below it, even contexts that
//! would individually prefer to split.

use std::collections::BTreeMap;

use crate::logger::FitLogger;
use crate::tree::{ContextNode, ContextTree};
use crate::vocabulary::SymbolId;

use super::{local_log_likelihood, MethodKind, Pruner, ScoreTree};

/// Per-node BIC values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BicScore {
    /// Best penalized log-likelihood of the subtree.
    pub v: f64,
    /// Whether splitting beat stopping here. Always `false` at leaves.
    pub chi: bool,
}

/// Prunes with the Bayesian information criterion.
///
/// The complexity penalty `ln(n) · (-(|A| - 1) / 2)` is added once per
/// context, with `n` the sample length and `|A|` the vocabulary size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BicSolver;

impl BicSolver {
    /// BIC penalty per context.
    #[inline]
    pub fn penalty(n_samples: usize, n_symbols: usize) -> f64 {
        (n_samples as f64).ln() * (-((n_symbols as f64) - 1.0) / 2.0)
    }

    /// Compute `V` and `chi` for every node of `tree`.
    pub fn score(&self, tree: &ContextTree, n_samples: usize) -> ScoreTree<BicScore> {
        let adj = Self::penalty(n_samples, tree.vocabulary().len());
        ScoreTree::build(
            tree.root(),
            &|node: &ContextNode, children: &BTreeMap<SymbolId, ScoreTree<BicScore>>| {
                let local = local_log_likelihood(node) + adj;
                if node.is_leaf() {
                    return BicScore {
                        v: local,
                        chi: false,
                    };
                }
                let v_children: f64 = children.values().map(|c| c.value.v).sum();
                BicScore {
                    v: local.max(v_children),
                    chi: v_children > local,
                }
            },
        )
    }
}

/// Descend through `chi = 1` nodes; prune at the first `chi = 0`.
fn prune_gated(node: &mut ContextNode, score: &ScoreTree<BicScore>) {
    if !score.value.chi {
        node.prune();
        return;
    }
    if let Some(children) = node.children_mut() {
        for (s, child) in children.iter_mut() {
            if let Some(child_score) = score.children.get(s) {
                prune_gated(child, child_score);
            }
        }
    }
}

impl Pruner for BicSolver {
    fn kind(&self) -> MethodKind {
        MethodKind::Bic
    }

    fn prune(&self, tree: &mut ContextTree, sample: &[SymbolId], _logger: &FitLogger) {
        let scores = self.score(tree, sample.len());
        prune_gated(tree.root_mut(), &scores);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::SampleCounter;
    use crate::{Parallelism, Verbosity, Vocabulary};

    fn counted(max_order: usize, sample: &[SymbolId]) -> ContextTree {
        let mut tree = ContextTree::new(max_order, Vocabulary::new(["a", "b"]).unwrap()).unwrap();
        SampleCounter::new(false)
            .fit(&mut tree, sample, Parallelism::Sequential)
            .unwrap();
        tree
    }

    #[test]
    fn penalty_matches_formula() {
        let adj = BicSolver::penalty(100, 3);
        assert!((adj - (-(100f64).ln())).abs() < 1e-12);
        assert_eq!(BicSolver::penalty(100, 1), 0.0);
    }

    #[test]
    fn leaves_never_split() {
        let sample: Vec<SymbolId> = (0..40).map(|i| (i % 3 == 0) as SymbolId).collect();
        let tree = counted(2, &sample);
        let scores = BicSolver.score(&tree, sample.len());
        for leaf in tree.leaves() {
            assert!(!scores.get(leaf.context()).unwrap().value.chi);
        }
    }

    #[test]
    fn internal_value_is_max_of_stop_and_split() {
        let sample: Vec<SymbolId> = (0..60).map(|i| ((i * 7 + i / 5) % 2) as SymbolId).collect();
        let tree = counted(2, &sample);
        let scores = BicSolver.score(&tree, sample.len());
        let adj = BicSolver::penalty(sample.len(), 2);
        for node in tree.nodes().filter(|n| !n.is_leaf()) {
            let score = scores.get(node.context()).unwrap();
            let local = local_log_likelihood(node) + adj;
            let children: f64 = score.children.values().map(|c| c.value.v).sum();
            assert_eq!(score.value.v, local.max(children));
            assert_eq!(score.value.chi, children > local);
        }
    }

    #[test]
    fn periodic_sample_keeps_order_two_structure() {
        // "aab" repeated: the next symbol is determined by the last two symbols
        let sample: Vec<SymbolId> = (0..90).map(|i| (i % 3 == 2) as SymbolId).collect();
        let mut tree = counted(2, &sample);
        BicSolver
            .apply(&mut tree, &sample, &FitLogger::new(Verbosity::Silent))
            .unwrap();
        assert!(!tree.root().is_leaf());
        assert!(!tree.node(&[0]).unwrap().is_leaf());
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn iid_sample_prunes_to_root() {
        // A constant sample has nothing to gain from context
        let sample = vec![0; 50];
        let mut tree = counted(3, &sample);
        BicSolver
            .apply(&mut tree, &sample, &FitLogger::new(Verbosity::Silent))
            .unwrap();
        assert!(tree.root().is_leaf());
    }
}
