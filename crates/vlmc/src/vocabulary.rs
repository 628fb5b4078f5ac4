//! Ordered symbol vocabulary.
//!
//! Symbols are arbitrary strings; internally every symbol is a dense
//! [`SymbolId`] in vocabulary order. Samples are encoded once and all
//! counting runs on ids, so multi-character symbols can never be confused
//! with concatenations of shorter ones.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ConfigError, VlmcError};

/// Dense index of a symbol in its [`Vocabulary`].
pub type SymbolId = u32;

/// Rendering of the empty context.
pub const ROOT_WORD: &str = "root";

/// An ordered set of distinct symbols, fixed for the lifetime of a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    symbols: Vec<String>,
    index: HashMap<String, SymbolId>,
}

impl Vocabulary {
    /// Build a vocabulary from symbols in their canonical order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyVocabulary`] if no symbol is given,
    /// [`ConfigError::DuplicateSymbol`] if a symbol repeats.
    pub fn new<I, S>(symbols: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let symbols: Vec<String> = symbols.into_iter().map(|s| s.to_string()).collect();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        let mut index = HashMap::with_capacity(symbols.len());
        for (id, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.clone(), id as SymbolId).is_some() {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }

        Ok(Self { symbols, index })
    }

    /// Number of symbols.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always `false` for a constructed vocabulary; provided for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbol ids in vocabulary order.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + Clone {
        0..self.symbols.len() as SymbolId
    }

    /// Symbols in vocabulary order.
    #[inline]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Look up the id of `symbol`.
    #[inline]
    pub fn id(&self, symbol: &str) -> Option<SymbolId> {
        self.index.get(symbol).copied()
    }

    /// The symbol for `id`, if in range.
    #[inline]
    pub fn symbol(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id as usize).map(String::as_str)
    }

    /// Encode a sample of symbols into ids.
    ///
    /// # Errors
    ///
    /// [`VlmcError::UnknownSymbol`] for the first symbol not in the vocabulary.
    pub fn encode<S: AsRef<str>>(&self, sample: &[S]) -> Result<Vec<SymbolId>, VlmcError> {
        sample
            .iter()
            .map(|s| {
                let s = s.as_ref();
                self.id(s)
                    .ok_or_else(|| VlmcError::UnknownSymbol(s.to_string()))
            })
            .collect()
    }

    /// Check that an already-encoded sample only uses ids of this vocabulary.
    pub fn check_encoded(&self, sample: &[SymbolId]) -> Result<(), VlmcError> {
        match sample.iter().find(|&&s| s as usize >= self.len()) {
            Some(&symbol) => Err(VlmcError::SymbolOutOfRange {
                symbol,
                n_symbols: self.len(),
            }),
            None => Ok(()),
        }
    }

    /// Decode ids back to symbols. Out-of-range ids render as `"?"`.
    pub fn decode(&self, ids: &[SymbolId]) -> Vec<&str> {
        ids.iter()
            .map(|&id| self.symbol(id).unwrap_or("?"))
            .collect()
    }

    /// Render a context (oldest symbol first) as the concatenation of its
    /// symbols. The empty context renders as [`ROOT_WORD`].
    pub fn render(&self, context: &[SymbolId]) -> String {
        if context.is_empty() {
            return ROOT_WORD.to_string();
        }
        self.decode(context).concat()
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.symbols.join(", "))
    }
}
