//! Greedy selection with recomputed-savings reinsertion.
//!
//! The naive heap score overstates a pattern's worth: once other
//! abbreviations claim overlapping text, its real usage drops. The loop
//! therefore re-evaluates every popped pattern against the set selected so
//! far and only keeps it if its marginal contribution still beats the best
//! of what remains; otherwise it goes back on the heap with its real score
//! and something else gets a turn.

use crate::corpus::Corpus;
use crate::pattern::{PatternId, PatternStore, ScoreHeap};
use crate::rescore::{EncodingParams, Rescorer};
use crate::utils::progress::ProgressBar;
use log::debug;

/// Extra slots selected beyond the target when throw-back is active, giving
/// the churn some slack before the final trim.
const OVERSAMPLE: usize = 5;

#[derive(Debug, Clone)]
pub struct PickOptions {
    /// Target abbreviation count.
    pub count: usize,
    /// Return already-selected members to the heap when a later pick
    /// outscores them.
    pub throwback: bool,
}

/// Select up to `count` patterns from the heap. Whatever the loop rejects
/// or trims stays on the heap as the residue for refinement.
pub fn pick(
    corpus: &mut Corpus,
    store: &mut PatternStore,
    heap: &mut ScoreHeap,
    rescorer: &mut Rescorer,
    params: &EncodingParams,
    opts: &PickOptions,
) -> Vec<PatternId> {
    let oversample = if opts.throwback { OVERSAMPLE } else { 0 };
    let target = opts.count + oversample;

    let mut best: Vec<PatternId> = Vec::with_capacity(target);
    let mut prev_savings = 0i64;

    let progress = ProgressBar::new(target as u64);
    progress.set_message("selecting");

    while best.len() < target {
        let Some(id) = heap.pop(store) else { break };
        best.push(id);

        let result = rescorer.rescore(corpus, store, &best, params, false);
        let delta = result.savings - prev_savings;

        if delta <= 0 {
            // No marginal contribution against the current set; gone for good.
            best.pop();
            continue;
        }

        if let Some(peek) = heap.peek_score(store) {
            if delta < peek {
                // Worse than what remains: back on the heap at its real score.
                best.pop();
                store[id].savings = delta;
                heap.push(store, id);
                continue;
            }
        }

        store[id].savings = delta;
        prev_savings = result.savings;
        progress.inc(1);

        if opts.throwback {
            let mut removed = false;
            for idx in (0..best.len()).rev() {
                let q = best[idx];
                if q != id && store[q].savings < delta {
                    best.remove(idx);
                    heap.push(store, q);
                    removed = true;
                }
            }
            if removed {
                let result = rescorer.rescore(corpus, store, &best, params, false);
                prev_savings = result.savings;
            }
        }
    }

    // Trim the oversample: weakest members join the residue.
    while best.len() > opts.count {
        let (idx, _) = best
            .iter()
            .enumerate()
            .min_by_key(|&(_, &q)| store[q].savings)
            .expect("best is non-empty here");
        let q = best.remove(idx);
        heap.push(store, q);
    }

    progress.finish_and_clear();
    debug!("picked {} patterns, total savings {}", best.len(), prev_savings);
    best
}
