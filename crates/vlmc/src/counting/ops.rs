//! Pure counting kernels.
//!
//! Every function here reads the sample and one context and returns counts by
//! value, so calls can be fanned out over worker threads freely.

use crate::vocabulary::SymbolId;

/// Count, for every symbol `s`, the overlapping occurrences of `word · s`
/// in `sample`. The result is indexed by [`SymbolId`].
///
/// A single scan replaces one substring search per symbol: every match of
/// `word` that is followed by a symbol is attributed to that symbol.
pub fn count_extensions(sample: &[SymbolId], n_symbols: usize, word: &[SymbolId]) -> Vec<u64> {
    let mut counts = vec![0u64; n_symbols];
    let len = word.len();
    for end in len..sample.len() {
        if &sample[end - len..end] == word {
            counts[sample[end] as usize] += 1;
        }
    }
    counts
}

/// Occurrences of a leaf context, counted through its one-symbol extensions.
///
/// Equal to [`count_word`] except for a match that ends the sample, which
/// has no following symbol and is not counted.
#[inline]
pub fn count_leaf(sample: &[SymbolId], n_symbols: usize, word: &[SymbolId]) -> u64 {
    count_extensions(sample, n_symbols, word).iter().sum()
}

/// Overlapping occurrences of `word` in `sample`.
pub fn count_word(sample: &[SymbolId], word: &[SymbolId]) -> u64 {
    if word.is_empty() {
        return sample.len() as u64 + 1;
    }
    sample.windows(word.len()).filter(|w| *w == word).count() as u64
}

/// Contexts among `leaves` that are a suffix of `window`.
pub fn associated_contexts<'a>(leaves: &[&'a [SymbolId]], window: &[SymbolId]) -> Vec<&'a [SymbolId]> {
    leaves
        .iter()
        .copied()
        .filter(|leaf| window.ends_with(leaf))
        .collect()
}

/// Depth bound `floor(ln n)` for contexts estimable from `n` samples.
#[inline]
pub fn depth_bound(n_samples: usize) -> usize {
    if n_samples <= 1 {
        return 0;
    }
    (n_samples as f64).ln().floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_count_overlapping_matches() {
        // a=0, b=1: "aaab"
        let sample = [0, 0, 0, 1];
        assert_eq!(count_extensions(&sample, 2, &[0]), vec![2, 1]);
        assert_eq!(count_extensions(&sample, 2, &[0, 0]), vec![1, 1]);
        assert_eq!(count_extensions(&sample, 2, &[1]), vec![0, 0]);
    }

    #[test]
    fn empty_word_counts_every_following_symbol() {
        let sample = [0, 1, 1, 0, 1];
        assert_eq!(count_extensions(&sample, 2, &[]), vec![2, 3]);
    }

    #[test]
    fn word_longer_than_sample_never_matches() {
        assert_eq!(count_extensions(&[0, 1], 2, &[0, 1, 0]), vec![0, 0]);
        assert_eq!(count_word(&[0, 1], &[0, 1, 0]), 0);
    }

    #[test]
    fn leaf_count_misses_only_the_final_match() {
        // "abab": "ab" occurs twice, the second one ends the sample
        let sample = [0, 1, 0, 1];
        assert_eq!(count_word(&sample, &[0, 1]), 2);
        assert_eq!(count_leaf(&sample, 2, &[0, 1]), 1);
        // "ba" occurs once, followed by b
        assert_eq!(count_word(&sample, &[1, 0]), 1);
        assert_eq!(count_leaf(&sample, 2, &[1, 0]), 1);
    }

    #[test]
    fn associated_contexts_match_suffixes() {
        let a: &[SymbolId] = &[0];
        let ab: &[SymbolId] = &[0, 1];
        let bb: &[SymbolId] = &[1, 1];
        let leaves = [a, ab, bb];
        assert_eq!(associated_contexts(&leaves, &[1, 0, 1]), vec![ab]);
        assert_eq!(associated_contexts(&leaves, &[1, 1, 0]), vec![a]);
        assert!(associated_contexts(&leaves, &[0, 1, 2]).is_empty());
    }

    #[test]
    fn depth_bound_is_floor_of_natural_log() {
        assert_eq!(depth_bound(1), 0);
        assert_eq!(depth_bound(2), 0);
        assert_eq!(depth_bound(8), 2);
        assert_eq!(depth_bound(20), 2);
        assert_eq!(depth_bound(21), 3);
        assert_eq!(depth_bound(1000), 6);
    }
}
