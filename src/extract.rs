//! Pattern enumeration over the suffix/LCP arrays.
//!
//! One sweep of the LCP array visits every repeated substring of the corpus
//! exactly once (a hash dictionary absorbs re-encounters). Candidates with a
//! positive naive score enter the pattern store; repeats longer than the
//! abbreviation cutoff are routed to a separate long-pattern list that feeds
//! the refactoring-hint report.

use crate::corpus::SEPARATOR;
use crate::index::GeneralizedSuffixArray;
use crate::pattern::{naive_score, Pattern, PatternId, PatternStore};
use crate::zscii::{Alphabet, PLACEHOLDER};
use ahash::{AHashMap, AHashSet};
use log::debug;

/// Longest key admitted as an abbreviation candidate, in characters.
pub const MAX_PATTERN_LEN: usize = 20;

/// A repeated string too long to abbreviate; reported as a refactoring hint.
#[derive(Debug, Clone)]
pub struct LongDuplicate {
    pub text: Vec<u8>,
    pub freq: u32,
}

/// Everything the enumeration phase produces.
pub struct ExtractResult {
    pub store: PatternStore,
    /// Patterns admitted with a positive naive score.
    pub admitted: Vec<PatternId>,
    /// Long repeats, nested duplicates suppressed.
    pub long_duplicates: Vec<LongDuplicate>,
}

/// Bytes that disqualify a key outright.
fn key_is_clean(key: &[u8]) -> bool {
    !key.iter()
        .any(|&b| b == SEPARATOR || b == b'@' || b == PLACEHOLDER)
}

/// Enumerate every repeated substring and score it.
pub fn extract_patterns(gsa: &GeneralizedSuffixArray, alphabet: &Alphabet) -> ExtractResult {
    let text = gsa.text();
    let n = gsa.len();

    let mut store = PatternStore::new();
    let mut admitted = Vec::new();
    let mut seen: AHashMap<&[u8], ()> = AHashMap::new();
    let mut long_seen: AHashMap<&[u8], u32> = AHashMap::new();

    for i in 0..n {
        let pos = gsa.suffix(i) as usize;
        if text[pos] == SEPARATOR {
            continue;
        }

        // Lengths already produced at an earlier index start below lcp[i];
        // lengths shared with the next suffix run up to lcp[i+1].
        let start = gsa.lcp(i).max(1);
        let end = if i + 1 < n { gsa.lcp(i + 1) } else { 0 };

        for len in start..=end {
            if len < 2 {
                continue;
            }
            let key = &text[pos..pos + len as usize];
            if !key_is_clean(key) {
                continue;
            }

            if key.len() > MAX_PATTERN_LEN {
                if !long_seen.contains_key(key) {
                    let freq = gsa.range_count(i, len);
                    long_seen.insert(key, freq);
                }
                continue;
            }

            if seen.contains_key(key) {
                continue;
            }
            seen.insert(key, ());

            let cost = alphabet.string_cost(key);
            let freq = gsa.range_count(i, len);
            if naive_score(freq, cost) > 0 {
                let id = store.insert(Pattern::new(key.to_vec(), cost, freq));
                admitted.push(id);
            }
        }
    }

    let long_duplicates = dedup_long(long_seen);

    debug!(
        "enumerated {} candidates, {} long repeats",
        admitted.len(),
        long_duplicates.len()
    );

    ExtractResult {
        store,
        admitted,
        long_duplicates,
    }
}

/// Suppress nested long duplicates: processing shortest-first, a key whose
/// head (`key[1..]`) or tail (`key[..len-1]`) has already been seen is an
/// extension of an already-known repeat. Both kept and suppressed keys feed
/// the seen-set so whole extension chains collapse to one representative.
fn dedup_long(long_seen: AHashMap<&[u8], u32>) -> Vec<LongDuplicate> {
    let mut entries: Vec<(&[u8], u32)> = long_seen.into_iter().collect();
    entries.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut seen: AHashSet<&[u8]> = AHashSet::new();
    let mut kept = Vec::new();
    for (key, freq) in entries {
        let head = &key[1..];
        let tail = &key[..key.len() - 1];
        if !seen.contains(head) && !seen.contains(tail) {
            kept.push(LongDuplicate {
                text: key.to_vec(),
                freq,
            });
        }
        seen.insert(key);
    }

    // Most promising hints first.
    kept.sort_by_key(|d| {
        std::cmp::Reverse((d.freq as u64).saturating_mul(d.text.len() as u64))
    });
    kept
}
