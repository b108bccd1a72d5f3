//! Generalized suffix array builder.
//!
//! Builds a suffix array over the concatenation of all corpus strings,
//! separated by a non-occurring byte, by:
//! 1. Concatenating string content with sentinel separators
//! 2. Sorting suffixes with the Manber-Myers doubling construction
//! 3. Computing the LCP array with Kasai's algorithm
//!
//! The LCP array turns substring frequency into a range query: the number
//! of occurrences of the length-l prefix of suffix `sa[i]` is the size of
//! the maximal window around i where adjacent LCP values stay >= l.

use crate::corpus::SEPARATOR;
use anyhow::{bail, Result};

/// Position in the concatenated text.
pub type TextPosition = u32;

/// Boundary of one corpus string in the concatenated text.
#[derive(Debug, Clone, Copy)]
pub struct StringBoundary {
    /// Index of the string in the corpus.
    pub string_id: u32,
    /// Start position (inclusive).
    pub start: TextPosition,
    /// End position (exclusive, before the separator).
    pub end: TextPosition,
}

/// Accumulates corpus strings, then builds the suffix and LCP arrays.
pub struct SuffixArrayBuilder {
    text: Vec<u8>,
    boundaries: Vec<StringBoundary>,
}

impl SuffixArrayBuilder {
    pub fn new() -> Self {
        Self {
            text: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    /// Append one string followed by the separator.
    ///
    /// Returns `true` if the string was added (empty strings are skipped).
    pub fn add_string(&mut self, string_id: u32, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        debug_assert!(!content.contains(&SEPARATOR));

        let start = self.text.len() as TextPosition;
        self.text.extend_from_slice(content);
        let end = self.text.len() as TextPosition;
        self.text.push(SEPARATOR);

        self.boundaries.push(StringBoundary {
            string_id,
            start,
            end,
        });
        true
    }

    pub fn text_size(&self) -> usize {
        self.text.len()
    }

    /// Build the suffix array and LCP array from accumulated strings.
    pub fn build(self) -> Result<GeneralizedSuffixArray> {
        if self.boundaries.is_empty() {
            bail!("no data to index");
        }

        let text = self.text;
        let sa = build_suffix_array(&text);
        let lcp = build_lcp(&text, &sa);

        Ok(GeneralizedSuffixArray {
            text,
            sa,
            lcp,
            boundaries: self.boundaries,
        })
    }
}

impl Default for SuffixArrayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Suffix array, LCP array, and string boundaries over the concatenated
/// corpus.
#[derive(Debug)]
pub struct GeneralizedSuffixArray {
    text: Vec<u8>,
    sa: Vec<TextPosition>,
    lcp: Vec<u32>,
    boundaries: Vec<StringBoundary>,
}

impl GeneralizedSuffixArray {
    /// The concatenated text, separators included.
    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Number of suffixes (= text length).
    #[inline]
    pub fn len(&self) -> usize {
        self.sa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sa.is_empty()
    }

    /// Start position of the i-th suffix in sorted order.
    #[inline]
    pub fn suffix(&self, i: usize) -> TextPosition {
        self.sa[i]
    }

    /// Longest common prefix of suffixes `sa[i-1]` and `sa[i]` (`lcp[0]` is 0).
    #[inline]
    pub fn lcp(&self, i: usize) -> u32 {
        self.lcp[i]
    }

    /// Number of occurrences of the length-`len` prefix of suffix `sa[i]`:
    /// the size of the maximal window around i where every adjacent LCP
    /// value is >= `len`. Overlapping occurrences are all counted.
    pub fn range_count(&self, i: usize, len: u32) -> u32 {
        let n = self.sa.len();
        let mut lo = i;
        while lo > 0 && self.lcp[lo] >= len {
            lo -= 1;
        }
        let mut hi = i;
        while hi + 1 < n && self.lcp[hi + 1] >= len {
            hi += 1;
        }
        (hi - lo + 1) as u32
    }

    /// Map a global text position to the corpus string containing it.
    /// Separator positions belong to no string.
    pub fn position_to_string(&self, pos: TextPosition) -> Option<u32> {
        let idx = self
            .boundaries
            .binary_search_by(|b| {
                if pos < b.start {
                    std::cmp::Ordering::Greater
                } else if pos >= b.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()?;
        Some(self.boundaries[idx].string_id)
    }
}

/// Manber-Myers doubling construction.
///
/// Ranks suffixes by their first k characters, doubling k each round:
/// sort by (rank[i], rank[i+k]), re-rank, repeat until all ranks are
/// distinct or k >= 2n. O(n log^2 n) with the comparison sort.
fn build_suffix_array(text: &[u8]) -> Vec<TextPosition> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sa: Vec<TextPosition> = (0..n as TextPosition).collect();
    let mut rank: Vec<u32> = text.iter().map(|&b| b as u32).collect();
    let mut next_rank: Vec<u32> = vec![0; n];

    let mut k = 1usize;
    loop {
        // Key for suffix i: rank of its first k chars, then rank of the
        // next k (0 when the suffix is shorter than k).
        let key = |i: usize| -> (u32, u32) {
            let tail = if i + k < n { rank[i + k] + 1 } else { 0 };
            (rank[i], tail)
        };

        sa.sort_unstable_by_key(|&i| key(i as usize));

        next_rank[sa[0] as usize] = 0;
        for j in 1..n {
            let prev = sa[j - 1] as usize;
            let cur = sa[j] as usize;
            next_rank[cur] = next_rank[prev] + u32::from(key(cur) != key(prev));
        }

        std::mem::swap(&mut rank, &mut next_rank);

        if rank[sa[n - 1] as usize] as usize == n - 1 {
            break;
        }
        k *= 2;
        if k >= 2 * n {
            break;
        }
    }

    sa
}

/// Kasai's O(n) LCP construction.
fn build_lcp(text: &[u8], sa: &[TextPosition]) -> Vec<u32> {
    let n = sa.len();
    let mut rank = vec![0u32; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s as usize] = i as u32;
    }

    let mut lcp = vec![0u32; n];
    let mut h = 0usize;
    for i in 0..n {
        let r = rank[i] as usize;
        if r == 0 {
            h = 0;
            continue;
        }
        let j = sa[r - 1] as usize;
        while i + h < n && j + h < n && text[i + h] == text[j + h] {
            h += 1;
        }
        lcp[r] = h as u32;
        h = h.saturating_sub(1);
    }
    lcp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_from(strings: &[&[u8]]) -> GeneralizedSuffixArray {
        let mut builder = SuffixArrayBuilder::new();
        for (id, s) in strings.iter().enumerate() {
            builder.add_string(id as u32, s);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let builder = SuffixArrayBuilder::new();
        let err = builder.build().unwrap_err();
        assert_eq!(err.to_string(), "no data to index");
    }

    #[test]
    fn test_banana_order() {
        // Suffixes of "banana" + separator, sorted. The separator (0x0B)
        // sorts before every letter.
        let gsa = build_from(&[b"banana"]);
        let expected: Vec<TextPosition> = vec![6, 5, 3, 1, 0, 4, 2];
        let got: Vec<TextPosition> = (0..gsa.len()).map(|i| gsa.suffix(i)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_suffixes_sorted() {
        let gsa = build_from(&[b"the cat sat", b"the dog ran"]);
        let text = gsa.text();
        for i in 1..gsa.len() {
            let a = &text[gsa.suffix(i - 1) as usize..];
            let b = &text[gsa.suffix(i) as usize..];
            assert!(a <= b, "suffixes out of order at {}", i);
        }
    }

    #[test]
    fn test_lcp_matches_naive() {
        let gsa = build_from(&[b"mississippi"]);
        let text = gsa.text();
        for i in 1..gsa.len() {
            let a = &text[gsa.suffix(i - 1) as usize..];
            let b = &text[gsa.suffix(i) as usize..];
            let naive = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
            assert_eq!(gsa.lcp(i), naive as u32, "lcp mismatch at {}", i);
        }
    }

    #[test]
    fn test_range_count_frequency() {
        // "aba" once in each string plus one extra "ab".
        let gsa = build_from(&[b"abaxaba", b"abay"]);
        // Find a suffix starting with "aba" and count length-3 prefixes.
        let text = gsa.text();
        let i = (0..gsa.len())
            .find(|&i| text[gsa.suffix(i) as usize..].starts_with(b"aba"))
            .unwrap();
        assert_eq!(gsa.range_count(i, 3), 3);
        assert_eq!(gsa.range_count(i, 2), 3);
        assert_eq!(gsa.range_count(i, 1), 6); // every "a" in both strings
    }

    #[test]
    fn test_range_count_overlapping() {
        // "aaaa": "aa" occurs at 0, 1, 2 (overlaps counted).
        let gsa = build_from(&[b"aaaa"]);
        let text = gsa.text();
        let i = (0..gsa.len())
            .find(|&i| text[gsa.suffix(i) as usize..].starts_with(b"aa"))
            .unwrap();
        assert_eq!(gsa.range_count(i, 2), 3);
    }

    #[test]
    fn test_position_to_string() {
        let gsa = build_from(&[b"hello", b"world"]);
        assert_eq!(gsa.position_to_string(0), Some(0));
        assert_eq!(gsa.position_to_string(4), Some(0));
        assert_eq!(gsa.position_to_string(5), None); // separator
        assert_eq!(gsa.position_to_string(6), Some(1));
        assert_eq!(gsa.position_to_string(10), Some(1));
    }
}
