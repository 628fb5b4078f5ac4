//! Error types for tree construction, counting and fitting.
//!
//! - [`ConfigError`]: invalid vocabulary, maximum order or solver parameters
//! - [`CoverageError`]: a sample window that no admissible context (or more than one) explains
//! - [`VlmcError`]: everything that can abort a fit

use crate::solvers::MethodKind;

/// Invalid construction or solver parameters.
///
/// Raised eagerly, before any counting is spent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("vocabulary must contain at least one symbol")]
    EmptyVocabulary,

    #[error("symbol {0:?} appears more than once in the vocabulary")]
    DuplicateSymbol(String),

    #[error("max_order must be >= 1, got {0}")]
    InvalidMaxOrder(usize),

    #[error("unknown pruning method {0:?} (expected \"bic\", \"context\" or \"bct\")")]
    UnknownMethod(String),

    #[error("{method} beta must be in {range}, got {value}")]
    InvalidBeta {
        method: MethodKind,
        range: &'static str,
        value: f64,
    },

    #[error("context algorithm alpha must be > 0, got {0}")]
    InvalidAlpha(f64),
}

/// A sample window that the admissible tree cannot associate to exactly one context.
///
/// Windows are rendered with the vocabulary, oldest symbol first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverageError {
    #[error("window {window:?} could not be associated to any context of the admissible tree")]
    Unrepresented { window: String },

    #[error("window {window:?} is associated to more than one context: {contexts:?}")]
    Ambiguous {
        window: String,
        contexts: Vec<String>,
    },
}

/// Errors returned by [`SampleCounter::fit`](crate::counting::SampleCounter::fit),
/// [`VlmcModel::fit`](crate::model::VlmcModel::fit) and sample encoding.
#[derive(Debug, thiserror::Error)]
pub enum VlmcError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Coverage(#[from] CoverageError),

    #[error("symbol {0:?} is not part of the vocabulary")]
    UnknownSymbol(String),

    #[error("symbol id {symbol} is out of range for a vocabulary of {n_symbols} symbols")]
    SymbolOutOfRange { symbol: u32, n_symbols: usize },

    #[error("cannot fit a context tree on an empty sample")]
    EmptySample,

    #[error("sample of {len} symbol(s) has no context followed by a symbol")]
    SampleTooShort { len: usize },

    #[error("context tree has no counts; run the sample counter before pruning")]
    NotCounted,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
