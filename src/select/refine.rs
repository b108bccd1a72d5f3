//! Rounding-aware refinement of the selected set.
//!
//! Selection optimizes z-character savings, but the Z-machine stores text in
//! padded words: a string costing 7 z-chars occupies the same bytes as one
//! costing 9. These passes mutate the selected set and keep any change that
//! lowers the padded byte total from a full rescore.
//!
//! - Replacement: swap residual-heap patterns into the set (levels 2-3).
//! - Boundary adjustment: trim or extend key edges, chasing the space
//!   characters that word-anchored patterns tend to carry (levels 1+).

use crate::corpus::Corpus;
use crate::extract::MAX_PATTERN_LEN;
use crate::pattern::{PatternId, PatternStore, ScoreHeap};
use crate::rescore::{EncodingParams, Rescorer};
use crate::utils::progress::ProgressBar;
use crate::zscii::SPACE_SENTINEL;
use log::debug;

#[derive(Debug, Clone)]
pub struct RefineOptions {
    /// Compression level 0-3.
    pub level: u8,
    /// Residual patterns tried during replacement.
    pub passes: u32,
    /// Replacement pops that test every set position (level 3).
    pub deep_passes: u32,
}

/// Run the refinement stages for the configured level and return the final
/// padded byte total. Frequencies in the store reflect the final set.
pub fn refine(
    corpus: &mut Corpus,
    store: &mut PatternStore,
    best: &mut Vec<PatternId>,
    residual: &mut ScoreHeap,
    rescorer: &mut Rescorer,
    params: &EncodingParams,
    opts: &RefineOptions,
) -> u64 {
    let mut current = rescorer
        .rescore(corpus, store, best, params, true)
        .total_bytes;
    debug!("refinement start: {} bytes", current);

    if opts.level >= 2 && !best.is_empty() {
        current = replace_from_residue(corpus, store, best, residual, rescorer, params, opts, current);
        debug!("after replacement: {} bytes", current);
    }

    if opts.level >= 1 {
        current = adjust_boundaries(corpus, store, best, rescorer, params, current);
        debug!("after boundary adjustment: {} bytes", current);
    }

    // Leave store frequencies consistent with the committed set.
    let final_bytes = rescorer
        .rescore(corpus, store, best, params, true)
        .total_bytes;
    debug_assert_eq!(final_bytes, current);
    final_bytes
}

/// Substring test in either direction.
fn related(a: &[u8], b: &[u8]) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.windows(short.len()).any(|w| w == short)
}

/// Pop residual patterns and try them in place of selected ones.
#[allow(clippy::too_many_arguments)]
fn replace_from_residue(
    corpus: &mut Corpus,
    store: &mut PatternStore,
    best: &mut [PatternId],
    residual: &mut ScoreHeap,
    rescorer: &mut Rescorer,
    params: &EncodingParams,
    opts: &RefineOptions,
    mut current: u64,
) -> u64 {
    let longest = best
        .iter()
        .map(|&id| store[id].key.len())
        .max()
        .unwrap_or(0);
    let max_len = longest.min(MAX_PATTERN_LEN) + 2;

    let progress = ProgressBar::new(opts.passes as u64);
    progress.set_message("replacement");

    let mut pops = 0u32;
    while pops < opts.passes {
        let Some(qid) = residual.pop(store) else { break };
        pops += 1;
        progress.inc(1);

        if store[qid].key.len() > max_len {
            continue; // consumes the pass slot anyway
        }

        let deep = opts.level >= 3 && pops <= opts.deep_passes;
        if deep {
            // Try every position, commit the best improvement.
            let mut best_bytes = current;
            let mut best_at = None;
            for i in 0..best.len() {
                let old = best[i];
                best[i] = qid;
                let bytes = rescorer
                    .rescore(corpus, store, best, params, true)
                    .total_bytes;
                best[i] = old;
                if bytes < best_bytes {
                    best_bytes = bytes;
                    best_at = Some(i);
                }
            }
            if let Some(i) = best_at {
                let old = std::mem::replace(&mut best[i], qid);
                current = best_bytes;
                residual.push(store, old);
            }
        } else {
            // Only positions whose key nests with the candidate's, first
            // improvement wins.
            for i in 0..best.len() {
                if !related(&store[best[i]].key, &store[qid].key) {
                    continue;
                }
                let old = best[i];
                best[i] = qid;
                let bytes = rescorer
                    .rescore(corpus, store, best, params, true)
                    .total_bytes;
                if bytes < current {
                    current = bytes;
                    residual.push(store, old);
                    break;
                }
                best[i] = old;
            }
        }
    }

    progress.finish_and_clear();
    current
}

/// Two sweeps of edge mutations over every selected pattern.
fn adjust_boundaries(
    corpus: &mut Corpus,
    store: &mut PatternStore,
    best: &[PatternId],
    rescorer: &mut Rescorer,
    params: &EncodingParams,
    mut current: u64,
) -> u64 {
    let progress = ProgressBar::new(2 * best.len() as u64);
    progress.set_message("boundary adjustment");

    for _ in 0..2 {
        for i in 0..best.len() {
            progress.inc(1);

            // Leading space: drop it, or try gaining one.
            let key = store[best[i]].key.clone();
            let candidate = if key[0] == SPACE_SENTINEL {
                key[1..].to_vec()
            } else {
                let mut k = Vec::with_capacity(key.len() + 1);
                k.push(SPACE_SENTINEL);
                k.extend_from_slice(&key);
                k
            };
            try_mutation(corpus, store, best, i, candidate, rescorer, params, &mut current);

            // Trailing space, symmetrically.
            let key = store[best[i]].key.clone();
            let candidate = if *key.last().expect("keys are non-empty") == SPACE_SENTINEL {
                key[..key.len() - 1].to_vec()
            } else {
                let mut k = key.clone();
                k.push(SPACE_SENTINEL);
                k
            };
            try_mutation(corpus, store, best, i, candidate, rescorer, params, &mut current);

            // Single-character trims.
            let key = store[best[i]].key.clone();
            if key.len() >= 3 {
                try_mutation(corpus, store, best, i, key[1..].to_vec(), rescorer, params, &mut current);
            }
            let key = store[best[i]].key.clone();
            if key.len() >= 3 {
                try_mutation(
                    corpus,
                    store,
                    best,
                    i,
                    key[..key.len() - 1].to_vec(),
                    rescorer,
                    params,
                    &mut current,
                );
            }

            // Two-character trims.
            let key = store[best[i]].key.clone();
            if key.len() >= 5 {
                try_mutation(corpus, store, best, i, key[2..].to_vec(), rescorer, params, &mut current);
            }
            let key = store[best[i]].key.clone();
            if key.len() >= 5 {
                try_mutation(
                    corpus,
                    store,
                    best,
                    i,
                    key[..key.len() - 2].to_vec(),
                    rescorer,
                    params,
                    &mut current,
                );
            }
        }
    }

    progress.finish_and_clear();
    current
}

/// Rewrite the key of `best[i]`, keep the change iff the padded byte total
/// drops. The cost is always recomputed from the alphabet; occurrence lists
/// are invalidated on both commit and rollback.
#[allow(clippy::too_many_arguments)]
fn try_mutation(
    corpus: &mut Corpus,
    store: &mut PatternStore,
    best: &[PatternId],
    i: usize,
    new_key: Vec<u8>,
    rescorer: &mut Rescorer,
    params: &EncodingParams,
    current: &mut u64,
) -> bool {
    if new_key.len() < 2 {
        return false;
    }
    // Colliding with another selected key would waste a slot.
    if best
        .iter()
        .enumerate()
        .any(|(j, &q)| j != i && store[q].key == new_key)
    {
        return false;
    }

    let id = best[i];
    let old_key = std::mem::replace(&mut store[id].key, new_key);
    let old_cost = store[id].cost;
    store[id].cost = params.alphabet.string_cost(&store[id].key);
    store[id].invalidate_occurrences();

    let bytes = rescorer
        .rescore(corpus, store, best, params, true)
        .total_bytes;
    if bytes < *current {
        *current = bytes;
        true
    } else {
        store[id].key = old_key;
        store[id].cost = old_cost;
        store[id].invalidate_occurrences();
        false
    }
}
