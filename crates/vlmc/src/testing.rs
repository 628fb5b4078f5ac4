//! Test utilities: seeded sample generators and tree invariant checks.
//!
//! Shared by unit tests, integration tests and benches.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::tree::{ContextNode, ContextTree};
use crate::vocabulary::SymbolId;

/// Default tolerance for probability sums.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Sample generators
// =============================================================================

/// `len` symbols cycling through `period`.
///
/// `periodic_sample(5, &[0, 1])` is `[0, 1, 0, 1, 0]`.
pub fn periodic_sample(len: usize, period: &[SymbolId]) -> Vec<SymbolId> {
    if period.is_empty() {
        return Vec::new();
    }
    period.iter().copied().cycle().take(len).collect()
}

/// Alternating binary sample `0101…` of length `len`.
pub fn alternating_sample(len: usize) -> Vec<SymbolId> {
    periodic_sample(len, &[0, 1])
}

/// Independent uniform symbols.
pub fn uniform_sample(len: usize, n_symbols: usize, seed: u64) -> Vec<SymbolId> {
    assert!(n_symbols > 0);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(0..n_symbols) as SymbolId)
        .collect()
}

/// A variable length Markov source: next-symbol distributions per context.
///
/// The distribution used at each step is that of the longest listed context
/// matching the end of the history (oldest symbol first); histories matching
/// nothing draw uniformly.
#[derive(Clone, Debug)]
pub struct ContextSource {
    n_symbols: usize,
    contexts: Vec<(Vec<SymbolId>, Vec<f64>)>,
}

impl ContextSource {
    pub fn new(n_symbols: usize) -> Self {
        assert!(n_symbols > 0);
        Self {
            n_symbols,
            contexts: Vec::new(),
        }
    }

    /// Add a context with its next-symbol distribution (normalized here).
    pub fn with_context(mut self, context: &[SymbolId], weights: &[f64]) -> Self {
        assert_eq!(weights.len(), self.n_symbols);
        let total: f64 = weights.iter().sum();
        assert!(total > 0.0);
        let probs = weights.iter().map(|w| w / total).collect();
        self.contexts.push((context.to_vec(), probs));
        self
    }

    /// Binary order-2 source: after "1" mostly "0", after "10" mostly "1",
    /// after "00" mostly "0".
    pub fn binary_order_two() -> Self {
        Self::new(2)
            .with_context(&[1], &[0.9, 0.1])
            .with_context(&[1, 0], &[0.2, 0.8])
            .with_context(&[0, 0], &[0.7, 0.3])
    }

    fn distribution(&self, history: &[SymbolId]) -> Option<&[f64]> {
        self.contexts
            .iter()
            .filter(|(context, _)| history.ends_with(context))
            .max_by_key(|(context, _)| context.len())
            .map(|(_, probs)| probs.as_slice())
    }

    /// Draw `len` symbols.
    pub fn simulate(&self, len: usize, seed: u64) -> Vec<SymbolId> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut sample: Vec<SymbolId> = Vec::with_capacity(len);
        for _ in 0..len {
            let next = match self.distribution(&sample) {
                Some(probs) => {
                    let u: f64 = rng.gen();
                    let mut acc = 0.0;
                    probs
                        .iter()
                        .position(|&p| {
                            acc += p;
                            u < acc
                        })
                        .unwrap_or(self.n_symbols - 1)
                }
                None => rng.gen_range(0..self.n_symbols),
            };
            sample.push(next as SymbolId);
        }
        sample
    }
}

// =============================================================================
// Assertions
// =============================================================================

/// Assert the invariants every counted tree must satisfy.
///
/// - [`ContextTree::validate`] succeeds
/// - transition probabilities of every node that occurred sum to 1
/// - a node that never occurred has undefined probabilities
///
/// # Panics
///
/// On the first violated invariant, naming the context.
pub fn assert_tree_invariants(tree: &ContextTree) {
    if let Err(err) = tree.validate() {
        panic!("invalid tree: {err}");
    }
    for node in tree.nodes().filter(|n| n.is_counted()) {
        assert_probabilities(tree, node);
    }
}

fn assert_probabilities(tree: &ContextTree, node: &ContextNode) {
    let probs = node.transition_probabilities();
    let total: u64 = node.transition_counts().iter().sum();
    if node.occurrence_count() == 0 || total == 0 {
        assert!(
            probs.iter().all(|p| p.is_nan()),
            "context {} never occurred but has probabilities {probs:?}",
            tree.word(node)
        );
        return;
    }
    let sum: f64 = probs.iter().sum();
    assert!(
        approx::abs_diff_eq!(sum, 1.0, epsilon = DEFAULT_TOLERANCE),
        "probabilities of {} sum to {sum}",
        tree.word(node)
    );
}

/// Assert that every length-`depth` window of `sample` ends with exactly one leaf.
pub fn assert_leaf_partition(tree: &ContextTree, sample: &[SymbolId]) {
    let leaves: Vec<&[SymbolId]> = tree.leaves().map(ContextNode::context).collect();
    let depth = tree.depth();
    for end in depth..sample.len() {
        let window = &sample[end - depth..end];
        let matches = leaves.iter().filter(|leaf| window.ends_with(leaf)).count();
        assert_eq!(
            matches,
            1,
            "window {} matches {matches} leaves",
            tree.vocabulary().render(window)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_cycles() {
        assert_eq!(periodic_sample(5, &[0, 1, 2]), vec![0, 1, 2, 0, 1]);
        assert_eq!(alternating_sample(4), vec![0, 1, 0, 1]);
        assert!(periodic_sample(3, &[]).is_empty());
    }

    #[test]
    fn uniform_is_seeded_and_in_range() {
        let a = uniform_sample(200, 3, 7);
        assert_eq!(a, uniform_sample(200, 3, 7));
        assert!(a.iter().all(|&s| s < 3));
        assert_ne!(a, uniform_sample(200, 3, 8));
    }

    #[test]
    fn source_follows_deterministic_contexts() {
        let source = ContextSource::new(2)
            .with_context(&[0], &[0.0, 1.0])
            .with_context(&[1], &[1.0, 0.0]);
        let sample = source.simulate(50, 1);
        for pair in sample.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn longest_context_wins() {
        let source = ContextSource::new(2)
            .with_context(&[0], &[1.0, 0.0])
            .with_context(&[1, 0], &[0.0, 1.0]);
        assert_eq!(source.distribution(&[1, 0]), Some(&[0.0, 1.0][..]));
        assert_eq!(source.distribution(&[0, 0]), Some(&[1.0, 0.0][..]));
        assert_eq!(source.distribution(&[1]), None);
    }
}
