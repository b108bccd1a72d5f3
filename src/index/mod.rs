//! Corpus indexing.
//!
//! A single generalized suffix array over the concatenated corpus drives
//! pattern enumeration: every repeated substring shows up as a run of
//! adjacent suffixes with a long enough common prefix.

pub mod suffix_array;

pub use suffix_array::{GeneralizedSuffixArray, SuffixArrayBuilder};
