//! The selection driver.
//!
//! Runs the whole pipeline over an ingested corpus: build the generalized
//! suffix array, enumerate and rank candidate patterns, greedily select the
//! working set, then refine it against the padded byte total. Everything is
//! parameterized through [`EncodingParams`] and [`SelectionOptions`]; the
//! driver holds no global state.

pub mod picker;
pub mod refine;

use crate::corpus::Corpus;
use crate::extract::{extract_patterns, ExtractResult, LongDuplicate};
use crate::index::SuffixArrayBuilder;
use crate::pattern::{naive_score, ScoreHeap};
use crate::rescore::{EncodingParams, Rescorer};
use anyhow::Result;
use log::{debug, info};

/// Knobs for one selection run.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    /// Number of abbreviations to select.
    pub count: usize,
    /// Throw already-selected low scorers back onto the heap.
    pub throwback: bool,
    /// Compression level 0-3.
    pub level: u8,
    /// Replacement-pass budget (levels 2-3).
    pub passes: u32,
    /// Deep replacement budget (level 3).
    pub deep_passes: u32,
    /// Skip selection and only gather the long-duplicate report.
    pub only_refactor: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            count: 96,
            throwback: false,
            level: 1,
            passes: 10_000,
            deep_passes: 1_000,
            only_refactor: false,
        }
    }
}

/// One selected abbreviation, ready for emission.
#[derive(Debug, Clone)]
pub struct Abbreviation {
    /// Sentinel-substituted key text.
    pub key: Vec<u8>,
    /// Usage count in the final optimal parse.
    pub freq: u32,
    /// Key cost in z-characters.
    pub cost: u32,
    /// Final savings score.
    pub score: i64,
}

/// Result of a selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectionOutcome {
    /// Selected abbreviations, best score first.
    pub abbreviations: Vec<Abbreviation>,
    /// Long repeats for the refactoring report.
    pub long_duplicates: Vec<LongDuplicate>,
    /// Padded corpus bytes with no abbreviations at all.
    pub bytes_before: u64,
    /// Padded corpus bytes with the final set applied.
    pub bytes_after: u64,
}

/// Run enumeration, selection, and refinement over the corpus.
pub fn run_selection(
    corpus: &mut Corpus,
    params: &EncodingParams,
    opts: &SelectionOptions,
) -> Result<SelectionOutcome> {
    let mut builder = SuffixArrayBuilder::new();
    for (id, s) in corpus.strings.iter().enumerate() {
        builder.add_string(id as u32, &s.text);
    }
    let gsa = builder.build()?;
    info!(
        "indexed {} strings, {} characters",
        corpus.len(),
        gsa.len()
    );

    let ExtractResult {
        mut store,
        admitted,
        long_duplicates,
    } = extract_patterns(&gsa, &params.alphabet);
    drop(gsa);
    info!("{} candidate patterns", admitted.len());

    if opts.only_refactor {
        return Ok(SelectionOutcome {
            long_duplicates,
            ..Default::default()
        });
    }

    let mut heap = ScoreHeap::new();
    for &id in &admitted {
        heap.push(&mut store, id);
    }
    debug!("naive ranking complete");

    let mut rescorer = Rescorer::new();
    let bytes_before = rescorer
        .rescore(corpus, &mut store, &[], params, true)
        .total_bytes;

    let mut best = picker::pick(
        corpus,
        &mut store,
        &mut heap,
        &mut rescorer,
        params,
        &picker::PickOptions {
            count: opts.count,
            throwback: opts.throwback,
        },
    );
    info!("selected {} abbreviations", best.len());

    let bytes_after = refine::refine(
        corpus,
        &mut store,
        &mut best,
        &mut heap,
        &mut rescorer,
        params,
        &refine::RefineOptions {
            level: opts.level,
            passes: opts.passes,
            deep_passes: opts.deep_passes,
        },
    );
    info!(
        "refined: {} -> {} bytes ({} saved)",
        bytes_before,
        bytes_after,
        bytes_before.saturating_sub(bytes_after)
    );

    let mut abbreviations: Vec<Abbreviation> = best
        .iter()
        .map(|&id| {
            let p = &store[id];
            Abbreviation {
                key: p.key.clone(),
                freq: p.freq,
                cost: p.cost,
                score: naive_score(p.freq, p.cost),
            }
        })
        .collect();
    abbreviations.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.key.cmp(&b.key)));

    Ok(SelectionOutcome {
        abbreviations,
        long_duplicates,
        bytes_before,
        bytes_after,
    })
}
