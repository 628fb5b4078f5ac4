//! Fitted VLMC model.
//!
//! High-level wrapper around a pruned [`ContextTree`] with fitting and
//! prediction. Access components via [`tree()`](VlmcModel::tree) and
//! [`config()`](VlmcModel::config).

use ndarray::Array2;

use crate::counting::SampleCounter;
use crate::error::VlmcError;
use crate::logger::FitLogger;
use crate::solvers::Pruner;
use crate::tree::{ContextNode, ContextTree};
use crate::utils::{run_with_threads, Parallelism};
use crate::vocabulary::{SymbolId, Vocabulary};

use super::VlmcConfig;

/// A variable length Markov chain fitted on one sample.
///
/// # Example
///
/// ```
/// use vlmc::{PruningMethod, VlmcConfig, VlmcModel, Vocabulary};
///
/// let vocab = Vocabulary::new(["a", "b"]).unwrap();
/// let sample: Vec<&str> = (0..100).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
/// let config = VlmcConfig::builder()
///     .max_order(3)
///     .method(PruningMethod::context_algorithm())
///     .build()
///     .unwrap();
///
/// let model = VlmcModel::fit(vocab, &sample, config).unwrap();
/// // after "a" always comes "b"
/// assert_eq!(model.predict_proba(&["b", "a"]).unwrap(), &[0.0, 1.0]);
/// ```
#[derive(Clone, Debug)]
pub struct VlmcModel {
    tree: ContextTree,
    config: VlmcConfig,
}

impl VlmcModel {
    /// Fit a model on a sample of symbols.
    ///
    /// # Errors
    ///
    /// - [`VlmcError::UnknownSymbol`] if the sample uses a symbol outside `vocabulary`
    /// - any error of [`fit_encoded`](Self::fit_encoded)
    pub fn fit<S: AsRef<str>>(
        vocabulary: Vocabulary,
        sample: &[S],
        config: VlmcConfig,
    ) -> Result<Self, VlmcError> {
        let encoded = vocabulary.encode(sample)?;
        Self::fit_encoded(vocabulary, &encoded, config)
    }

    /// Fit a model on a sample already encoded with `vocabulary`.
    ///
    /// Builds the full tree to `config.max_order`, counts the sample into it
    /// and prunes it with `config.method`. Counting runs on a pool of
    /// `config.n_threads` workers.
    ///
    /// # Errors
    ///
    /// - [`VlmcError::Config`] for an invalid configuration
    /// - [`VlmcError::EmptySample`], [`VlmcError::SampleTooShort`], [`VlmcError::SymbolOutOfRange`]
    /// - [`VlmcError::Coverage`] if the admissible tree cannot explain the sample
    /// - [`VlmcError::ThreadPool`] if the worker pool cannot be built
    pub fn fit_encoded(
        vocabulary: Vocabulary,
        sample: &[SymbolId],
        config: VlmcConfig,
    ) -> Result<Self, VlmcError> {
        config.validate()?;
        run_with_threads(config.n_threads, |parallelism| {
            Self::fit_inner(vocabulary, sample, config, parallelism)
        })?
    }

    /// Fit without thread pool management.
    fn fit_inner(
        vocabulary: Vocabulary,
        sample: &[SymbolId],
        config: VlmcConfig,
        parallelism: Parallelism,
    ) -> Result<Self, VlmcError> {
        let logger = FitLogger::new(config.verbosity);
        logger.log_start(sample.len(), vocabulary.len(), config.max_order);

        let mut tree = ContextTree::new(config.max_order, vocabulary)?;
        SampleCounter::new(config.make_admissible).fit_with_logger(
            &mut tree,
            sample,
            parallelism,
            &logger,
        )?;
        config.method.apply(&mut tree, sample, &logger)?;

        logger.finish(tree.n_leaves(), tree.depth());
        Ok(Self { tree, config })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The pruned context tree.
    pub fn tree(&self) -> &ContextTree {
        &self.tree
    }

    pub fn config(&self) -> &VlmcConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.tree.vocabulary()
    }

    /// Consume the model, returning the tree.
    pub fn into_tree(self) -> ContextTree {
        self.tree
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// The context used to predict what follows `history` (oldest symbol first).
    pub fn context_of(&self, history: &[SymbolId]) -> &ContextNode {
        self.tree.find_context(history)
    }

    /// Next-symbol distribution after `history`, indexed like the vocabulary.
    ///
    /// Entries are NaN when the matching context never occurred in the
    /// training sample.
    ///
    /// # Errors
    ///
    /// [`VlmcError::UnknownSymbol`] if `history` uses a symbol outside the vocabulary.
    pub fn predict_proba<S: AsRef<str>>(&self, history: &[S]) -> Result<&[f64], VlmcError> {
        let history = self.vocabulary().encode(history)?;
        Ok(self.context_of(&history).transition_probabilities())
    }

    /// Leaf contexts and their next-symbol distributions.
    ///
    /// Row `i` of the matrix belongs to the `i`-th returned word (pre-order),
    /// column `j` to symbol id `j`.
    pub fn transition_matrix(&self) -> (Vec<String>, Array2<f64>) {
        let n_symbols = self.vocabulary().len();
        let leaves: Vec<&ContextNode> = self.tree.leaves().collect();
        let mut matrix = Array2::from_elem((leaves.len(), n_symbols), f64::NAN);
        for (mut row, leaf) in matrix.rows_mut().into_iter().zip(&leaves) {
            for (cell, &p) in row.iter_mut().zip(leaf.transition_probabilities()) {
                *cell = p;
            }
        }
        let words = leaves.iter().map(|leaf| self.tree.word(leaf)).collect();
        (words, matrix)
    }

    /// Log-likelihood of `sample` under the fitted chain.
    ///
    /// Every position is scored with the context of the symbols before it,
    /// the first one with the root. Positions whose context gives the symbol
    /// no mass contribute `-inf`.
    ///
    /// # Errors
    ///
    /// [`VlmcError::UnknownSymbol`] if `sample` uses a symbol outside the vocabulary.
    pub fn log_likelihood<S: AsRef<str>>(&self, sample: &[S]) -> Result<f64, VlmcError> {
        let encoded = self.vocabulary().encode(sample)?;
        Ok(self.log_likelihood_encoded(&encoded))
    }

    /// [`log_likelihood`](Self::log_likelihood) for an encoded sample.
    pub fn log_likelihood_encoded(&self, sample: &[SymbolId]) -> f64 {
        (0..sample.len())
            .map(|i| {
                let p = self
                    .context_of(&sample[..i])
                    .transition_probabilities()
                    .get(sample[i] as usize)
                    .copied()
                    .unwrap_or(0.0);
                if p > 0.0 {
                    p.ln()
                } else {
                    f64::NEG_INFINITY
                }
            })
            .sum()
    }
}
