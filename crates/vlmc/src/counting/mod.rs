//! Sample counting and admissibility reduction.
//!
//! [`SampleCounter`] attaches occurrence and transition counts to a
//! [`ContextTree`](crate::ContextTree) and, when asked, reduces it to an
//! admissible tree first. The kernels in [`ops`] are pure functions over an
//! encoded sample and are what the counter fans out over worker threads.

mod counter;
pub mod ops;

pub use counter::{verify_word_association, SampleCounter};
