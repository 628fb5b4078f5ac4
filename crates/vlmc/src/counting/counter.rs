//! Sample counting and admissibility reduction.

use std::collections::HashMap;

use crate::error::{CoverageError, VlmcError};
use crate::logger::{AdmissibilityStats, FitLogger, Verbosity};
use crate::tree::{ContextNode, ContextTree};
use crate::utils::Parallelism;
use crate::vocabulary::SymbolId;

use super::ops::{associated_contexts, count_extensions, count_leaf, depth_bound};

// ============================================================================
// SampleCounter
// ============================================================================

/// Attaches occurrence and transition statistics to a [`ContextTree`].
///
/// Fitting runs, in order:
///
/// 1. depth truncation to `floor(ln n)` (admissible only)
/// 2. leaf counting, fanned out over the leaf contexts
/// 3. bottom-up aggregation of counts into internal nodes
/// 4. admissibility reduction (admissible only): drop contexts that never
///    occur, collapse single-child nodes, verify every sample window maps to
///    exactly one leaf
/// 5. transition counting for every node, fanned out over the contexts
///
/// Parallel phases complete before the tree is touched.
///
/// # Example
///
/// ```
/// use vlmc::{ContextTree, Parallelism, SampleCounter, Vocabulary};
///
/// let vocab = Vocabulary::new(["a", "b"]).unwrap();
/// let sample = vocab
///     .encode(&["a", "b", "b", "a", "b", "b", "a", "b", "a", "b"])
///     .unwrap();
/// let mut tree = ContextTree::new(2, vocab).unwrap();
///
/// SampleCounter::new(true).fit(&mut tree, &sample, Parallelism::Sequential).unwrap();
/// // every depth-2 history followed by a symbol
/// assert_eq!(tree.root().occurrence_count(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleCounter {
    make_admissible: bool,
}

impl SampleCounter {
    pub fn new(make_admissible: bool) -> Self {
        Self { make_admissible }
    }

    #[inline]
    pub fn make_admissible(&self) -> bool {
        self.make_admissible
    }

    /// Count `sample` into `tree` without logging.
    pub fn fit(
        &self,
        tree: &mut ContextTree,
        sample: &[SymbolId],
        parallelism: Parallelism,
    ) -> Result<(), VlmcError> {
        self.fit_with_logger(tree, sample, parallelism, &FitLogger::new(Verbosity::Silent))
    }

    /// Count `sample` into `tree`.
    ///
    /// # Errors
    ///
    /// - [`VlmcError::EmptySample`] for an empty sample
    /// - [`VlmcError::SampleTooShort`] if an admissible fit finds no counted
    ///   context (a single-symbol sample)
    /// - [`VlmcError::SymbolOutOfRange`] if the sample uses ids outside the vocabulary
    /// - [`VlmcError::Coverage`] if the admissible tree cannot explain a sample window
    pub fn fit_with_logger(
        &self,
        tree: &mut ContextTree,
        sample: &[SymbolId],
        parallelism: Parallelism,
        logger: &FitLogger,
    ) -> Result<(), VlmcError> {
        if sample.is_empty() {
            return Err(VlmcError::EmptySample);
        }
        tree.vocabulary().check_encoded(sample)?;

        if self.make_admissible {
            let bound = depth_bound(sample.len());
            if tree.max_order() > bound {
                truncate(tree.root_mut(), bound);
                // Root children always survive truncation.
                let truncated = bound.max(1);
                logger.log_truncation(tree.max_order(), truncated);
                tree.set_max_order(truncated);
            }
        }

        count_leaves(tree, sample, parallelism, logger);
        if self.make_admissible && tree.root().occurrence_count() == 0 {
            return Err(VlmcError::SampleTooShort { len: sample.len() });
        }

        // Root transitions are its children's counts. Capture them before the
        // reduction can collapse the root.
        let root_transitions: Vec<u64> = tree
            .vocabulary()
            .ids()
            .map(|s| tree.root().child(s).map_or(0, ContextNode::occurrence_count))
            .collect();

        if self.make_admissible {
            let removed = remove_non_appearing(tree.root_mut());
            let collapsed = make_irreducible(tree.root_mut());
            let max_depth = tree.depth();
            tree.set_max_order(max_depth);
            let windows = verify_word_association(tree, sample, parallelism)?;

            logger.log_admissibility(&AdmissibilityStats {
                removed,
                collapsed,
                max_depth,
                windows,
            });
        }

        count_transitions(tree, sample, root_transitions, parallelism);
        logger.log_transitions(tree.n_nodes());

        Ok(())
    }
}

// ============================================================================
// Counting phases
// ============================================================================

/// Count every leaf through its extensions, then aggregate bottom-up.
fn count_leaves(
    tree: &mut ContextTree,
    sample: &[SymbolId],
    parallelism: Parallelism,
    logger: &FitLogger,
) {
    let n_symbols = tree.vocabulary().len();
    let leaf_counts: HashMap<Vec<SymbolId>, u64> = {
        let leaves: Vec<&[SymbolId]> = tree.leaves().map(ContextNode::context).collect();
        let counts = parallelism.maybe_par_map(leaves.clone(), |word| {
            count_leaf(sample, n_symbols, word)
        });
        leaves.into_iter().map(<[SymbolId]>::to_vec).zip(counts).collect()
    };

    let total = aggregate_counts(tree.root_mut(), &leaf_counts);
    logger.log_leaf_counts(leaf_counts.len(), total);
}

/// Set every internal count to the sum of its children, leaves first.
fn aggregate_counts(node: &mut ContextNode, leaf_counts: &HashMap<Vec<SymbolId>, u64>) -> u64 {
    let count = match node.children_mut() {
        Some(children) => children
            .values_mut()
            .map(|child| aggregate_counts(child, leaf_counts))
            .sum(),
        None => leaf_counts.get(node.context()).copied().unwrap_or(0),
    };
    node.set_occurrence_count(count);
    count
}

/// Attach transition counts (and probabilities) to every node.
fn count_transitions(
    tree: &mut ContextTree,
    sample: &[SymbolId],
    root_transitions: Vec<u64>,
    parallelism: Parallelism,
) {
    let n_symbols = tree.vocabulary().len();
    let mut transitions: HashMap<Vec<SymbolId>, Vec<u64>> = {
        let words: Vec<&[SymbolId]> = tree
            .nodes()
            .filter(|n| !n.is_root())
            .map(ContextNode::context)
            .collect();
        let counts = parallelism.maybe_par_map(words.clone(), |word| {
            count_extensions(sample, n_symbols, word)
        });
        words.into_iter().map(<[SymbolId]>::to_vec).zip(counts).collect()
    };
    transitions.insert(Vec::new(), root_transitions);

    attach_transitions(tree.root_mut(), &mut transitions, n_symbols);
}

fn attach_transitions(
    node: &mut ContextNode,
    transitions: &mut HashMap<Vec<SymbolId>, Vec<u64>>,
    n_symbols: usize,
) {
    let counts = transitions
        .remove(node.context())
        .unwrap_or_else(|| vec![0; n_symbols]);
    node.set_transition_counts(counts);

    if let Some(children) = node.children_mut() {
        for child in children.values_mut() {
            attach_transitions(child, transitions, n_symbols);
        }
    }
}

// ============================================================================
// Admissibility reduction
// ============================================================================

/// Prune every node at depth `k` or deeper to a leaf. The root is never pruned.
fn truncate(node: &mut ContextNode, k: usize) {
    if node.is_root() || node.depth() < k {
        if let Some(children) = node.children_mut() {
            for child in children.values_mut() {
                truncate(child, k);
            }
        }
    } else {
        node.prune();
    }
}

/// Remove children that never occur, with their subtrees.
///
/// Returns the number of removed subtree roots.
fn remove_non_appearing(node: &mut ContextNode) -> usize {
    let Some(children) = node.children_mut() else {
        return 0;
    };
    let before = children.len();
    children.retain(|_, child| child.occurrence_count() > 0);
    let mut removed = before - children.len();
    for child in children.values_mut() {
        removed += remove_non_appearing(child);
    }
    removed
}

/// Collapse, leaves first, every internal node left with at most one child.
///
/// Returns the number of collapsed nodes.
fn make_irreducible(node: &mut ContextNode) -> usize {
    let Some(children) = node.children_mut() else {
        return 0;
    };
    let mut collapsed: usize = children.values_mut().map(make_irreducible).sum();
    if node.n_children() <= 1 {
        node.prune();
        collapsed += 1;
    }
    collapsed
}

/// Check that every sample window of the maximal leaf depth is explained by
/// exactly one leaf context.
///
/// Windows are the `d` symbols preceding each position `d..n` of the sample,
/// i.e. every history the tree must be able to predict from.
///
/// Returns the number of windows checked.
///
/// # Errors
///
/// [`CoverageError::Unrepresented`] for a window no leaf is a suffix of,
/// [`CoverageError::Ambiguous`] for a window with several matching leaves.
pub fn verify_word_association(
    tree: &ContextTree,
    sample: &[SymbolId],
    parallelism: Parallelism,
) -> Result<usize, CoverageError> {
    let leaves: Vec<&[SymbolId]> = tree.leaves().map(ContextNode::context).collect();
    let depth = leaves.iter().map(|l| l.len()).max().unwrap_or(0);
    if sample.len() <= depth {
        return Ok(0);
    }

    let ends: Vec<usize> = (depth..sample.len()).collect();
    let n_matches = parallelism.maybe_par_map(ends.clone(), |end| {
        let window = &sample[end - depth..end];
        leaves.iter().filter(|leaf| window.ends_with(leaf)).count()
    });

    let vocabulary = tree.vocabulary();
    for (&end, matches) in ends.iter().zip(n_matches) {
        let window = &sample[end - depth..end];
        match matches {
            1 => {}
            0 => {
                return Err(CoverageError::Unrepresented {
                    window: vocabulary.render(window),
                });
            }
            _ => {
                return Err(CoverageError::Ambiguous {
                    window: vocabulary.render(window),
                    contexts: associated_contexts(&leaves, window)
                        .into_iter()
                        .map(|c| vocabulary.render(c))
                        .collect(),
                });
            }
        }
    }

    Ok(ends.len())
}
