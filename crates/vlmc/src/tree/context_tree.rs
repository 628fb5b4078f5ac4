//! The context tree and its traversals.

use crate::error::ConfigError;
use crate::vocabulary::{SymbolId, Vocabulary};

use super::node::ContextNode;

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`ContextTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    /// A node is deeper than the tree's maximum order.
    #[error("context {context:?} has depth {depth} > max_order {max_order}")]
    DepthExceeded {
        context: String,
        depth: usize,
        max_order: usize,
    },
    /// A child's context is not its parent's context extended by its key.
    #[error("child {child:?} of {parent:?} does not extend its parent context")]
    ChildContextMismatch { parent: String, child: String },
    /// An internal node's count differs from the sum of its children.
    #[error("context {context:?} has count {count} but its children sum to {children_sum}")]
    CountNotConserved {
        context: String,
        count: u64,
        children_sum: u64,
    },
    /// Root transition count disagrees with the matching child count.
    #[error("root transition to {symbol:?} is {transition} but the child occurs {child_count} times")]
    RootTransitionMismatch {
        symbol: String,
        transition: u64,
        child_count: u64,
    },
}

// ============================================================================
// ContextTree
// ============================================================================

/// A context tree over a fixed vocabulary.
///
/// Construction builds the full tree to `max_order`: every internal node has
/// one child per symbol. Counting attaches statistics and may trim
/// non-appearing contexts; a solver then prunes the shape in place.
///
/// # Example
///
/// ```
/// use vlmc::{ContextTree, Vocabulary};
///
/// let vocab = Vocabulary::new(["a", "b"]).unwrap();
/// let tree = ContextTree::new(2, vocab).unwrap();
/// assert_eq!(tree.n_nodes(), 1 + 2 + 4);
/// assert_eq!(tree.leaves().count(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct ContextTree {
    root: ContextNode,
    vocabulary: Vocabulary,
    max_order: usize,
}

impl ContextTree {
    /// Build the full tree of all contexts up to length `max_order`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMaxOrder`] if `max_order == 0`,
    /// [`ConfigError::EmptyVocabulary`] if the vocabulary has no symbols.
    pub fn new(max_order: usize, vocabulary: Vocabulary) -> Result<Self, ConfigError> {
        if vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }
        if max_order == 0 {
            return Err(ConfigError::InvalidMaxOrder(max_order));
        }

        let root = ContextNode::full(Vec::new(), max_order, vocabulary.len());
        Ok(Self {
            root,
            vocabulary,
            max_order,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn root(&self) -> &ContextNode {
        &self.root
    }

    #[inline]
    pub(crate) fn root_mut(&mut self) -> &mut ContextNode {
        &mut self.root
    }

    #[inline]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Maximum context length this tree may hold.
    ///
    /// Starts as the construction order; admissible counting lowers it to
    /// the deepest retained leaf.
    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    #[inline]
    pub(crate) fn set_max_order(&mut self, max_order: usize) {
        self.max_order = max_order;
    }

    /// Render a node's context with the vocabulary (`"root"` for the root).
    #[inline]
    pub fn word(&self, node: &ContextNode) -> String {
        self.vocabulary.render(node.context())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Pre-order traversal (node before its children, children by symbol id)
    /// over the current shape of the tree.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            stack: vec![&self.root],
        }
    }

    /// Current leaves, in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &ContextNode> {
        self.nodes().filter(|n| n.is_leaf())
    }

    /// Number of nodes, root included.
    pub fn n_nodes(&self) -> usize {
        self.nodes().count()
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves().count()
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        self.leaves().map(ContextNode::depth).max().unwrap_or(0)
    }

    /// Node holding exactly `context` (oldest symbol first), if retained.
    pub fn node(&self, context: &[SymbolId]) -> Option<&ContextNode> {
        context
            .iter()
            .rev()
            .try_fold(&self.root, |node, &s| node.child(s))
    }

    /// Mutable access to the node holding exactly `context`, if retained.
    pub fn node_mut(&mut self, context: &[SymbolId]) -> Option<&mut ContextNode> {
        context
            .iter()
            .rev()
            .try_fold(&mut self.root, |node, &s| node.child_mut(s))
    }

    /// The context used to predict the symbol following `history`.
    ///
    /// Walks from the root along the most recent symbols of `history` and
    /// stops at a leaf, at the end of the history, or where the matching
    /// child was trimmed, returning the deepest node reached.
    pub fn find_context(&self, history: &[SymbolId]) -> &ContextNode {
        let mut node = &self.root;
        for &s in history.iter().rev() {
            match node.child(s) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check structural invariants of the current tree.
    ///
    /// - no node deeper than [`max_order`](Self::max_order)
    /// - every child extends its parent's context by its key
    /// - once counted, internal counts equal the sum of their children
    /// - once counted, root transitions equal its children's counts
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        for node in self.nodes() {
            if node.depth() > self.max_order {
                return Err(TreeValidationError::DepthExceeded {
                    context: self.word(node),
                    depth: node.depth(),
                    max_order: self.max_order,
                });
            }

            let Some(children) = node.children() else {
                continue;
            };

            for (&s, child) in children {
                let extends = child
                    .context()
                    .split_first()
                    .is_some_and(|(&head, tail)| head == s && tail == node.context());
                if !extends {
                    return Err(TreeValidationError::ChildContextMismatch {
                        parent: self.word(node),
                        child: self.word(child),
                    });
                }
            }

            if node.is_counted() {
                let children_sum: u64 = children.values().map(ContextNode::occurrence_count).sum();
                if children_sum != node.occurrence_count() {
                    return Err(TreeValidationError::CountNotConserved {
                        context: self.word(node),
                        count: node.occurrence_count(),
                        children_sum,
                    });
                }
            }
        }

        if self.root.is_counted() && !self.root.is_leaf() {
            for s in self.vocabulary.ids() {
                let transition = self.root.transition_counts()[s as usize];
                let child_count = self.root.child(s).map_or(0, ContextNode::occurrence_count);
                if transition != child_count {
                    return Err(TreeValidationError::RootTransitionMismatch {
                        symbol: self.vocabulary.render(&[s]),
                        transition,
                        child_count,
                    });
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Nodes iterator
// ============================================================================

/// Pre-order iterator over a [`ContextTree`]. See [`ContextTree::nodes`].
pub struct Nodes<'a> {
    stack: Vec<&'a ContextNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a ContextNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.iter_children().rev());
        Some(node)
    }
}
