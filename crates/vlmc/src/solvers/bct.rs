//! Bayesian context-tree pruning.
//!
//! Every node carries a Krichevsky–Trofimov log-estimate `P_e` of its
//! transitions and a maximal mixture value `P_m`:
//!
//! ```text
//! leaf:      P_m = P_e
//! internal:  P_m = max(ln(beta) + P_e, ln(1 - beta) + Σ_s P_m(s·w))
//! ```
//!
//! A node whose children do not win the maximum becomes a leaf.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::logger::FitLogger;
use crate::tree::{ContextNode, ContextTree};
use crate::vocabulary::SymbolId;

use super::{MethodKind, Pruner, ScoreTree};

/// Log of the KT estimator for a node with `transition_counts` and
/// `occurrence_count` occurrences over a vocabulary of `n_symbols`:
///
/// ```text
/// Σ_s Σ_{i=1..c_s} ln(i - 1/2)  -  Σ_{i=1..N} ln(i - 1 + |A|/2)
/// ```
///
/// A node with any zero transition count gets 0.
///
/// # Example
///
/// ```
/// use vlmc::solvers::kt_log_estimate;
///
/// // "ab": P(a) = 1/2, P(b | a) = 1/4
/// let p = kt_log_estimate(&[1, 1], 2, 2);
/// assert!((p - (1.0f64 / 8.0).ln()).abs() < 1e-12);
/// assert_eq!(kt_log_estimate(&[3, 0], 3, 2), 0.0);
/// ```
pub fn kt_log_estimate(transition_counts: &[u64], occurrence_count: u64, n_symbols: usize) -> f64 {
    if transition_counts.iter().any(|&c| c == 0) {
        return 0.0;
    }
    let half_alphabet = n_symbols as f64 / 2.0;
    let numerator: f64 = transition_counts
        .iter()
        .map(|&c| (1..=c).map(|i| (i as f64 - 0.5).ln()).sum::<f64>())
        .sum();
    let denominator: f64 = (1..=occurrence_count)
        .map(|i| (i as f64 - 1.0 + half_alphabet).ln())
        .sum();
    numerator - denominator
}

/// Per-node BCT values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BctScore {
    /// KT log-estimate of the node's own transitions.
    pub p_e: f64,
    /// Maximal mixture log-probability of the subtree.
    pub p_m: f64,
    /// Whether splitting won. `None` at leaves.
    pub is_child_p_m: Option<bool>,
}

/// Prunes with a Bayesian context-tree mixture.
///
/// `beta` is the prior weight of stopping at a node and must lie in `(0, 1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BctSolver {
    pub beta: f64,
}

impl Default for BctSolver {
    fn default() -> Self {
        Self { beta: 0.5 }
    }
}

impl BctSolver {
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }

    /// Compute `P_e`, `P_m` and the split flag for every node of `tree`.
    pub fn score(&self, tree: &ContextTree) -> ScoreTree<BctScore> {
        let n_symbols = tree.vocabulary().len();
        let ln_stop = self.beta.ln();
        let ln_split = (1.0 - self.beta).ln();
        ScoreTree::build(
            tree.root(),
            &|node: &ContextNode, children: &BTreeMap<SymbolId, ScoreTree<BctScore>>| {
                let p_e = kt_log_estimate(
                    node.transition_counts(),
                    node.occurrence_count(),
                    n_symbols,
                );
                if node.is_leaf() {
                    return BctScore {
                        p_e,
                        p_m: p_e,
                        is_child_p_m: None,
                    };
                }
                let stop = ln_stop + p_e;
                let split = ln_split + children.values().map(|c| c.value.p_m).sum::<f64>();
                BctScore {
                    p_e,
                    p_m: stop.max(split),
                    is_child_p_m: Some(split > stop),
                }
            },
        )
    }
}

/// Post-order: children are settled before their parent is tested.
fn prune_scored(node: &mut ContextNode, score: &ScoreTree<BctScore>) {
    if let Some(children) = node.children_mut() {
        for (s, child) in children.iter_mut() {
            if let Some(child_score) = score.children.get(s) {
                prune_scored(child, child_score);
            }
        }
    }
    if score.value.is_child_p_m == Some(false) {
        node.prune();
    }
}

impl Pruner for BctSolver {
    fn kind(&self) -> MethodKind {
        MethodKind::Bct
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.beta > 0.0 && self.beta < 1.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidBeta {
                method: MethodKind::Bct,
                range: "(0, 1)",
                value: self.beta,
            })
        }
    }

    fn prune(&self, tree: &mut ContextTree, _sample: &[SymbolId], _logger: &FitLogger) {
        let scores = self.score(tree);
        prune_scored(tree.root_mut(), &scores);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::SampleCounter;
    use crate::{Parallelism, Verbosity, Vocabulary};
    use approx::assert_abs_diff_eq;

    fn counted(max_order: usize, sample: &[SymbolId]) -> ContextTree {
        let mut tree = ContextTree::new(max_order, Vocabulary::new(["0", "1"]).unwrap()).unwrap();
        SampleCounter::new(false)
            .fit(&mut tree, sample, Parallelism::Sequential)
            .unwrap();
        tree
    }

    #[test]
    fn kt_estimate_matches_sequential_probabilities() {
        // "aab": 1/2 · 3/4 · 1/6
        let p = kt_log_estimate(&[2, 1], 3, 2);
        assert_abs_diff_eq!(p, (0.5f64 * 0.75 / 6.0).ln(), epsilon = 1e-12);
        // Three symbols, "abc": 1/3 · 1/5 · 1/7
        let p = kt_log_estimate(&[1, 1, 1], 3, 3);
        assert_abs_diff_eq!(p, (1.0f64 / 105.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn kt_estimate_is_zero_with_a_missing_symbol() {
        assert_eq!(kt_log_estimate(&[0, 0], 0, 2), 0.0);
        assert_eq!(kt_log_estimate(&[5, 0, 1], 6, 3), 0.0);
    }

    #[test]
    fn validate_requires_open_unit_interval() {
        assert!(BctSolver::default().validate().is_ok());
        for beta in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(BctSolver::new(beta).validate().is_err(), "beta = {beta}");
        }
    }

    #[test]
    fn internal_scores_follow_mixture_recursion() {
        let sample: Vec<SymbolId> = (0..50).map(|i| ((i * i + i / 3) % 2) as SymbolId).collect();
        let tree = counted(2, &sample);
        let solver = BctSolver::new(0.3);
        let scores = solver.score(&tree);
        for node in tree.nodes() {
            let score = scores.get(node.context()).unwrap().value;
            if node.is_leaf() {
                assert_eq!(score.p_m, score.p_e);
                assert_eq!(score.is_child_p_m, None);
            } else {
                let stop = 0.3f64.ln() + score.p_e;
                let split = (1.0 - 0.3f64).ln()
                    + scores
                        .get(node.context())
                        .unwrap()
                        .children
                        .values()
                        .map(|c| c.value.p_m)
                        .sum::<f64>();
                assert_eq!(score.p_m, stop.max(split));
                assert_eq!(score.is_child_p_m, Some(split > stop));
            }
        }
    }

    #[test]
    fn alternating_sample_keeps_first_order_symmetrically() {
        let sample: Vec<SymbolId> = (0..20).map(|i| (i % 2) as SymbolId).collect();
        let mut tree = counted(2, &sample);
        BctSolver::default()
            .apply(&mut tree, &sample, &FitLogger::new(Verbosity::Silent))
            .unwrap();
        assert!(!tree.root().is_leaf());
        let zero = tree.node(&[0]).unwrap();
        let one = tree.node(&[1]).unwrap();
        assert!(zero.is_leaf());
        assert_eq!(zero.is_leaf(), one.is_leaf());
    }
}
