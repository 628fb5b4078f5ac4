//! vlmc: variable length Markov chain estimation for Rust.
//!
//! A VLMC predicts the next symbol of a categorical sequence from a context
//! whose length varies with the history. Fitting builds a full context tree
//! over a vocabulary, counts a sample into it and prunes it with a model
//! selection criterion.
//!
//! # Key Types
//!
//! - [`VlmcModel`] / [`VlmcConfig`] - High-level fit and prediction
//! - [`ContextTree`] / [`ContextNode`] - The tree and its counted contexts
//! - [`SampleCounter`] - Counting and admissibility reduction
//! - [`PruningMethod`] - BIC, context algorithm or Bayesian context tree
//! - [`Vocabulary`] - Symbol encoding
//!
//! # Fitting
//!
//! Use `VlmcConfig::builder()` to configure, then `VlmcModel::fit()`.
//! The lower-level pipeline is available piecewise:
//!
//! ```
//! use vlmc::{ContextTree, Parallelism, Pruner, PruningMethod, SampleCounter, Verbosity};
//! use vlmc::{FitLogger, Vocabulary};
//!
//! let vocab = Vocabulary::new(["0", "1"]).unwrap();
//! let sample = vlmc::testing::alternating_sample(200);
//!
//! let mut tree = ContextTree::new(4, vocab).unwrap();
//! SampleCounter::new(true).fit(&mut tree, &sample, Parallelism::Sequential).unwrap();
//! PruningMethod::bic()
//!     .apply(&mut tree, &sample, &FitLogger::new(Verbosity::Silent))
//!     .unwrap();
//!
//! assert_eq!(tree.depth(), 1);
//! ```

// Re-export approx for users who want to compare probabilities
pub use approx;

pub mod counting;
pub mod error;
pub mod logger;
pub mod model;
pub mod solvers;
pub mod testing;
pub mod tree;
pub mod utils;
pub mod vocabulary;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{VlmcConfig, VlmcModel};

// Tree and counting
pub use counting::SampleCounter;
pub use tree::{ContextNode, ContextTree, TreeValidationError};
pub use vocabulary::{SymbolId, Vocabulary};

// Pruning
pub use solvers::{MethodKind, Pruner, PruningMethod};

// Errors and logging
pub use error::{ConfigError, CoverageError, VlmcError};
pub use logger::{FitLogger, Verbosity};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
