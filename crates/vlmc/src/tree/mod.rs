//! Context tree representation.
//!
//! - [`ContextTree`]: owning tree over a [`Vocabulary`](crate::Vocabulary), built to a maximum order
//! - [`ContextNode`]: one context with its counts, probabilities and owned children
//! - [`Nodes`]: pre-order traversal of the current shape
//! - [`TreeValidationError`]: structural invariant violations

mod context_tree;
mod node;

pub use context_tree::{ContextTree, Nodes, TreeValidationError};
pub use node::{Children, ContextNode};
