//! Context tree node.

use std::collections::BTreeMap;

use crate::vocabulary::SymbolId;

/// Children of an internal node, keyed by the symbol that extends the
/// parent context one step further into the past.
pub type Children = BTreeMap<SymbolId, ContextNode>;

/// A context (a finite run of recently observed symbols) and its statistics.
///
/// Contexts are stored oldest symbol first: the context `[x, y]` means "`x`
/// was followed by `y`, and `y` is the most recent symbol". A child of
/// context `w` keyed by `s` holds the context `s·w`. The root holds the empty
/// context.
///
/// A node exclusively owns its children. Pruning drops them for good.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextNode {
    context: Vec<SymbolId>,
    occurrence_count: u64,
    transition_counts: Vec<u64>,
    transition_probabilities: Vec<f64>,
    children: Option<Children>,
}

impl ContextNode {
    /// Build the full subtree below `context` down to `max_order`.
    pub(crate) fn full(context: Vec<SymbolId>, max_order: usize, n_symbols: usize) -> Self {
        let children = if context.len() < max_order {
            let children = (0..n_symbols as SymbolId)
                .map(|s| {
                    let mut extended = Vec::with_capacity(context.len() + 1);
                    extended.push(s);
                    extended.extend_from_slice(&context);
                    (s, Self::full(extended, max_order, n_symbols))
                })
                .collect();
            Some(children)
        } else {
            None
        };

        Self {
            context,
            occurrence_count: 0,
            transition_counts: Vec::new(),
            transition_probabilities: Vec::new(),
            children,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The context, oldest symbol first. Empty for the root.
    #[inline]
    pub fn context(&self) -> &[SymbolId] {
        &self.context
    }

    /// Length of the context (root depth is 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.context.len()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.context.is_empty()
    }

    /// `true` iff the node currently has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Occurrences of this context in the fitted sample.
    #[inline]
    pub fn occurrence_count(&self) -> u64 {
        self.occurrence_count
    }

    /// Per-symbol counts of this context being immediately followed by that
    /// symbol, indexed by [`SymbolId`]. Empty before counting.
    #[inline]
    pub fn transition_counts(&self) -> &[u64] {
        &self.transition_counts
    }

    /// Estimated next-symbol distribution, indexed by [`SymbolId`].
    ///
    /// All entries are NaN when `occurrence_count == 0`: the distribution is
    /// undefined for a context that never occurred. Empty before counting.
    #[inline]
    pub fn transition_probabilities(&self) -> &[f64] {
        &self.transition_probabilities
    }

    /// Whether transition statistics have been attached.
    #[inline]
    pub fn is_counted(&self) -> bool {
        !self.transition_counts.is_empty()
    }

    #[inline]
    pub fn children(&self) -> Option<&Children> {
        self.children.as_ref()
    }

    #[inline]
    pub fn child(&self, symbol: SymbolId) -> Option<&ContextNode> {
        self.children.as_ref()?.get(&symbol)
    }

    #[inline]
    pub fn child_mut(&mut self, symbol: SymbolId) -> Option<&mut ContextNode> {
        self.children.as_mut()?.get_mut(&symbol)
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        self.children.as_mut()
    }

    /// Iterate over the children (empty for leaves).
    #[inline]
    pub fn iter_children(&self) -> impl DoubleEndedIterator<Item = &ContextNode> {
        self.children.iter().flat_map(|c| c.values())
    }

    /// Number of children (0 for leaves).
    #[inline]
    pub fn n_children(&self) -> usize {
        self.children.as_ref().map_or(0, BTreeMap::len)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Turn this node into a leaf, discarding its whole subtree.
    ///
    /// Returns `true` if the node had children.
    pub fn prune(&mut self) -> bool {
        self.children.take().is_some()
    }

    /// Remove the child keyed by `symbol` together with its subtree.
    pub fn remove_child(&mut self, symbol: SymbolId) -> Option<ContextNode> {
        self.children.as_mut()?.remove(&symbol)
    }

    #[inline]
    pub(crate) fn set_occurrence_count(&mut self, count: u64) {
        self.occurrence_count = count;
    }

    /// Attach transition counts and derive the transition probabilities.
    ///
    /// Probabilities are the counts normalized by their total. At leaves and
    /// at the root that total equals `occurrence_count`; at other internal
    /// nodes it can differ by the occurrence at the very start of the sample,
    /// which has no preceding symbol to route it to a child.
    pub(crate) fn set_transition_counts(&mut self, counts: Vec<u64>) {
        let total: u64 = counts.iter().sum();
        self.transition_probabilities = if self.occurrence_count == 0 || total == 0 {
            vec![f64::NAN; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        self.transition_counts = counts;
    }
}
