//! Parallelism configuration and thread pool setup.
//!
//! Counting fans pure per-context calls out over a rayon pool and fans them
//! back in before any tree mutation happens. Components receive a
//! [`Parallelism`] flag; the pool itself is created once per fit by
//! [`run_with_threads`].

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, components may use `rayon` parallel iterators.
/// When `Sequential`, components must use sequential iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map `f` over `iter`, returning outputs aligned with the inputs.
    ///
    /// Output `i` is always `f(input_i)`, whichever worker computed it.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// The pool lives only for the duration of `f`.
///
/// # Errors
///
/// Returns the rayon build error if the pool cannot be created.
///
/// # Example
///
/// ```
/// use vlmc::run_with_threads;
///
/// let answer = run_with_threads(2, |_| 40 + 2).unwrap();
/// assert_eq!(answer, 42);
/// ```
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallelism_from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel()); // 1 = sequential
        assert!(Parallelism::from_threads(2).is_parallel()); // >1 = parallel
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn test_run_with_threads_sequential() {
        let result = run_with_threads(1, |p| (p, 42)).unwrap();
        assert_eq!(result, (Parallelism::Sequential, 42));
    }

    #[test]
    fn test_run_with_threads_explicit() {
        let result = run_with_threads(2, |_| rayon::current_num_threads()).unwrap();
        assert_eq!(result, 2);
    }

    #[test]
    fn test_maybe_par_map_preserves_input_order() {
        let inputs: Vec<usize> = (0..100).collect();
        let seq = Parallelism::Sequential.maybe_par_map(inputs.clone(), |i| i * 2);
        let par = run_with_threads(4, |p| p.maybe_par_map(inputs, |i| i * 2)).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq[..5], [0, 2, 4, 6, 8]);
    }
}
