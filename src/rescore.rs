//! Optimal-parse rescoring.
//!
//! Given a fixed candidate set, computes the minimum-cost abbreviated
//! encoding of every corpus string with Wagner's dynamic program: walk each
//! string right to left, at every index taking the cheaper of "emit this
//! character" and "emit a 2-z-char reference to a candidate anchored here".
//! The traceback then yields each candidate's real (non-overlapping) usage
//! count, which the greedy selector and the refiner both key on.
//!
//! This is the hot path of the whole crate: it runs once per selection step
//! and once per refinement probe. All scratch is pre-sized; the inner loop
//! only indexes into existing arrays.

use crate::corpus::Corpus;
use crate::pattern::{naive_score, PatternId, PatternStore};
use crate::zscii::{packed_round_unit, routine_pad_unit, Alphabet};
use ahash::AHashMap;

/// Encoding parameters shared by every scoring call in a run.
#[derive(Debug, Clone)]
pub struct EncodingParams {
    pub alphabet: Alphabet,
    pub zversion: u8,
    /// Force rounding unit 3 for packed strings regardless of version.
    pub force_r3: bool,
}

impl EncodingParams {
    pub fn new(alphabet: Alphabet, zversion: u8, force_r3: bool) -> Self {
        Self {
            alphabet,
            zversion,
            force_r3,
        }
    }
}

/// Outcome of one rescore pass.
#[derive(Debug, Clone, Copy)]
pub struct RescoreResult {
    /// Naive-formula savings over the candidate set, with parse frequencies.
    pub savings: i64,
    /// Total corpus bytes after rounding and routine padding. Only computed
    /// when requested.
    pub total_bytes: u64,
}

/// Owns the position-indexed candidate scratch reused across rescores.
#[derive(Debug, Default)]
pub struct Rescorer {
    /// possible[i]: candidate-set indexes with an occurrence at index i of
    /// the current string. Lists are cleared, never deallocated.
    possible: Vec<Vec<u32>>,
}

impl Rescorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescore the corpus against `set`.
    ///
    /// Rebuilds missing occurrence lists, runs the optimal parse over every
    /// string, rewrites each candidate's `freq` with its usage count, and
    /// updates per-string cost/rounding/bytes. With `report_bytes` the
    /// result also carries the padded byte total.
    pub fn rescore(
        &mut self,
        corpus: &mut Corpus,
        store: &mut PatternStore,
        set: &[PatternId],
        params: &EncodingParams,
        report_bytes: bool,
    ) -> RescoreResult {
        // Occurrence lists for any pattern that lacks them (new to the set,
        // or key mutated since the last pass).
        for &id in set {
            if store[id].occurrences.is_none() {
                let occ = build_occurrences(&store[id].key, corpus);
                store[id].occurrences = Some(occ);
            }
        }

        let max_len = corpus.strings.iter().map(|s| s.text.len()).max().unwrap_or(0);
        if self.possible.len() < max_len {
            self.possible.resize_with(max_len, Vec::new);
        }

        let mut counts = vec![0u32; set.len()];
        let store_ref: &PatternStore = store;

        for (sid, s) in corpus.strings.iter_mut().enumerate() {
            let n = s.text.len();

            for slot in self.possible[..n].iter_mut() {
                slot.clear();
            }
            for (si, &id) in set.iter().enumerate() {
                let occ = store_ref[id]
                    .occurrences
                    .as_ref()
                    .expect("occurrence lists built above");
                for &off in &occ[sid] {
                    self.possible[off as usize].push(si as u32);
                }
            }

            // Wagner's DP, right to left.
            s.cost_from[n] = 0;
            for i in (0..n).rev() {
                let mut best = s.cost_from[i + 1] + params.alphabet.char_cost(s.text[i]);
                let mut choice: i32 = -1;
                for &si in &self.possible[i] {
                    let p = &store_ref[set[si as usize]];
                    let c = 2 + s.cost_from[i + p.key.len()];
                    // Equal cost prefers the higher-z-cost abbreviation; a
                    // tie against the plain character keeps the character.
                    let take = c < best
                        || (c == best
                            && choice >= 0
                            && p.cost >= store_ref[set[choice as usize]].cost);
                    if take {
                        best = c;
                        choice = si as i32;
                    }
                }
                s.cost_from[i] = best;
                s.choice_at[i] = choice;
            }

            // Traceback: count each applied reference once; positions inside
            // an applied abbreviation are skipped.
            let mut i = 0;
            while i < n {
                let c = s.choice_at[i];
                if c >= 0 {
                    counts[c as usize] += 1;
                    i += store_ref[set[c as usize]].key.len();
                } else {
                    i += 1;
                }
            }

            s.min_cost = s.cost_from[0];
            let unit = if s.packed {
                packed_round_unit(params.zversion, params.force_r3)
            } else {
                3
            };
            s.rounding = (unit - s.min_cost % unit) % unit;
            s.bytes = 2 * (s.min_cost + s.rounding) / 3;
        }

        let mut savings = 0i64;
        for (si, &id) in set.iter().enumerate() {
            store[id].freq = counts[si];
            savings += naive_score(counts[si], store[id].cost);
        }

        let total_bytes = if report_bytes {
            total_padded_bytes(corpus, params.zversion)
        } else {
            0
        };

        RescoreResult {
            savings,
            total_bytes,
        }
    }
}

/// Left-anchored occurrence offsets of `key`, one list per corpus string.
fn build_occurrences(key: &[u8], corpus: &Corpus) -> Vec<Vec<u32>> {
    corpus
        .strings
        .iter()
        .map(|s| {
            let text = &s.text;
            if text.len() < key.len() {
                return Vec::new();
            }
            let mut offsets = Vec::new();
            for i in 0..=(text.len() - key.len()) {
                if &text[i..i + key.len()] == key {
                    offsets.push(i as u32);
                }
            }
            offsets
        })
        .collect()
}

/// Corpus bytes including per-routine code padding: each routine's code size
/// plus its inline strings, padded to the version's routine alignment.
fn total_padded_bytes(corpus: &Corpus, zversion: u8) -> u64 {
    let mut total: u64 = corpus.strings.iter().map(|s| s.bytes as u64).sum();

    let mut routine_totals: AHashMap<u32, u64> = AHashMap::new();
    for (&id, &size) in &corpus.routine_sizes {
        routine_totals.insert(id, size as u64);
    }
    for s in &corpus.strings {
        if let Some(rid) = s.routine_id {
            *routine_totals.entry(rid).or_insert(0) += s.bytes as u64;
        }
    }

    let unit = routine_pad_unit(zversion) as u64;
    for size in routine_totals.values() {
        total += (unit - size % unit) % unit;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::zscii::SPACE_SENTINEL;

    fn corpus_of(strings: &[&[u8]]) -> Corpus {
        let mut corpus = Corpus::new();
        for s in strings {
            corpus.add_string(s, false, false, None);
        }
        corpus
    }

    fn add_pattern(store: &mut PatternStore, alphabet: &Alphabet, key: &[u8]) -> PatternId {
        let cost = alphabet.string_cost(key);
        store.insert(Pattern::new(key.to_vec(), cost, 0))
    }

    fn params() -> EncodingParams {
        EncodingParams::new(Alphabet::default(), 3, false)
    }

    #[test]
    fn test_empty_set_is_plain_cost() {
        let mut corpus = corpus_of(&[b"hello"]);
        let mut store = PatternStore::new();
        let mut rescorer = Rescorer::new();
        rescorer.rescore(&mut corpus, &mut store, &[], &params(), false);
        assert_eq!(corpus.strings[0].min_cost, 5);
        // 5 z-chars round to 6, packing into 4 bytes.
        assert_eq!(corpus.strings[0].rounding, 1);
        assert_eq!(corpus.strings[0].bytes, 4);
    }

    #[test]
    fn test_overlap_resolved_to_single_use() {
        // "abcdabcd" matches at 0 and 4 of "abcdabcdabcd" but only fits once.
        let mut corpus = corpus_of(&[b"abcdabcdabcd"]);
        let mut store = PatternStore::new();
        let p = params();
        let id = add_pattern(&mut store, &p.alphabet, b"abcdabcd");
        let mut rescorer = Rescorer::new();
        rescorer.rescore(&mut corpus, &mut store, &[id], &p, false);
        assert_eq!(store[id].freq, 1);
        // Reference (2) + four plain chars.
        assert_eq!(corpus.strings[0].min_cost, 6);
    }

    #[test]
    fn test_optimal_beats_greedy() {
        // On "xyxyxy" with {"xy", "xyx"} the optimum spends 5 z-chars:
        // x, y, [xyx], y. Using "xy" three times would spend 6.
        let mut corpus = corpus_of(&[b"xyxyxy"]);
        let mut store = PatternStore::new();
        let p = params();
        let xy = add_pattern(&mut store, &p.alphabet, b"xy");
        let xyx = add_pattern(&mut store, &p.alphabet, b"xyx");
        let mut rescorer = Rescorer::new();
        rescorer.rescore(&mut corpus, &mut store, &[xy, xyx], &p, false);
        assert_eq!(corpus.strings[0].min_cost, 5);
        assert_eq!(store[xy].freq, 0);
        assert_eq!(store[xyx].freq, 1);
    }

    #[test]
    fn test_tie_against_plain_keeps_plain() {
        // A lone "xy" reference costs exactly the two characters it covers,
        // so nothing is gained and the plain parse must survive.
        let mut corpus = corpus_of(&[b"xyxyxy"]);
        let mut store = PatternStore::new();
        let p = params();
        let xy = add_pattern(&mut store, &p.alphabet, b"xy");
        let mut rescorer = Rescorer::new();
        rescorer.rescore(&mut corpus, &mut store, &[xy], &p, false);
        assert_eq!(corpus.strings[0].min_cost, 6);
        assert_eq!(store[xy].freq, 0);
        assert!(corpus.strings[0].choice_at[..6].iter().all(|&c| c == -1));
    }

    #[test]
    fn test_tie_prefers_higher_cost_pattern() {
        // "aBcdef": 'B' costs 2, so "aB" (cost 3) strictly beats the plain
        // parse at index 0, and "aBcd" (cost 5) reaches the same total via
        // the cheap "cdef" suffix. The higher-cost candidate must win the
        // tie in either set order.
        for order_flip in [false, true] {
            let mut corpus = corpus_of(&[b"aBcdef"]);
            let mut store = PatternStore::new();
            let p = params();
            let ab = add_pattern(&mut store, &p.alphabet, b"aB");
            let abcd = add_pattern(&mut store, &p.alphabet, b"aBcd");
            let cdef = add_pattern(&mut store, &p.alphabet, b"cdef");
            let set = if order_flip {
                vec![abcd, ab, cdef]
            } else {
                vec![ab, abcd, cdef]
            };
            let mut rescorer = Rescorer::new();
            rescorer.rescore(&mut corpus, &mut store, &set, &p, false);
            assert_eq!(corpus.strings[0].min_cost, 4);
            assert_eq!(store[abcd].freq, 1, "order_flip={}", order_flip);
            assert_eq!(store[ab].freq, 0, "order_flip={}", order_flip);
        }
    }

    #[test]
    fn test_savings_uses_parse_frequencies() {
        let mut corpus = corpus_of(&[b"abcdabcdabcd"]);
        let mut store = PatternStore::new();
        let p = params();
        let id = add_pattern(&mut store, &p.alphabet, b"abcdabcd");
        let mut rescorer = Rescorer::new();
        let result = rescorer.rescore(&mut corpus, &mut store, &[id], &p, false);
        // freq 1, cost 8: 1*6 - 9 = -3.
        assert_eq!(result.savings, -3);
    }

    #[test]
    fn test_packed_rounding_by_version() {
        let mut corpus = Corpus::new();
        corpus.add_string(b"hello", true, false, None);
        let mut store = PatternStore::new();
        let mut rescorer = Rescorer::new();

        let p5 = EncodingParams::new(Alphabet::default(), 5, false);
        rescorer.rescore(&mut corpus, &mut store, &[], &p5, false);
        // 5 z-chars pad to 6 (unit 6) = 4 bytes.
        assert_eq!(corpus.strings[0].rounding, 1);
        assert_eq!(corpus.strings[0].bytes, 4);

        let p8 = EncodingParams::new(Alphabet::default(), 8, false);
        rescorer.rescore(&mut corpus, &mut store, &[], &p8, false);
        // Unit 12: pad to 12 = 8 bytes.
        assert_eq!(corpus.strings[0].rounding, 7);
        assert_eq!(corpus.strings[0].bytes, 8);

        let forced = EncodingParams::new(Alphabet::default(), 8, true);
        rescorer.rescore(&mut corpus, &mut store, &[], &forced, false);
        assert_eq!(corpus.strings[0].rounding, 1);
        assert_eq!(corpus.strings[0].bytes, 4);
    }

    #[test]
    fn test_routine_padding() {
        let mut corpus = Corpus::new();
        // One inline string of 4 z-chars in routine 0 -> rounds to 6
        // z-chars = 4 bytes; code size 7 -> 11 bytes, padded to 12 (z3
        // routines align to 2).
        corpus.add_string(b"abcd", false, false, Some(0));
        corpus.add_routine_size(0, 7);
        let mut store = PatternStore::new();
        let mut rescorer = Rescorer::new();
        let result = rescorer.rescore(&mut corpus, &mut store, &[], &params(), true);
        assert_eq!(corpus.strings[0].bytes, 4);
        assert_eq!(result.total_bytes, 4 + 1);
    }

    #[test]
    fn test_occurrences_rebuilt_after_invalidation() {
        let mut corpus = corpus_of(&[b"hello world hello"]);
        let mut store = PatternStore::new();
        let p = params();
        let id = add_pattern(&mut store, &p.alphabet, b"hello");
        let mut rescorer = Rescorer::new();
        rescorer.rescore(&mut corpus, &mut store, &[id], &p, false);
        assert_eq!(store[id].freq, 2);

        // Mutate the key to the space-suffixed variant.
        store[id].key = vec![b'h', b'e', b'l', b'l', b'o', SPACE_SENTINEL];
        store[id].cost = p.alphabet.string_cost(&store[id].key);
        store[id].invalidate_occurrences();
        rescorer.rescore(&mut corpus, &mut store, &[id], &p, false);
        assert_eq!(store[id].freq, 1);
    }
}
