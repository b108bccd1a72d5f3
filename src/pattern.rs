//! Candidate abbreviation patterns and the savings-ordered heap.
//!
//! Patterns live in a single [`PatternStore`] arena for the whole run and
//! move between the heap, the selected set, and back, identified by their
//! [`PatternId`]. The heap repeatedly re-admits patterns with refreshed
//! scores; stale entries are filtered on pop by a per-pattern stamp, so a
//! plain binary heap suffices.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::{Index, IndexMut};

/// Index into the [`PatternStore`] arena.
pub type PatternId = usize;

/// A candidate abbreviation.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Key text (sentinel-substituted, >= 2 chars, no separator or `@`).
    pub key: Vec<u8>,
    /// Encoding cost of the key in z-characters.
    pub cost: u32,
    /// Occurrence count: naive (overlapping) after extraction, then usage
    /// count after each optimal parse.
    pub freq: u32,
    /// Current savings score. Heap entries not matching this are stale.
    pub savings: i64,
    /// Per-string left-anchored occurrence offsets, built lazily and
    /// invalidated whenever the key mutates.
    pub occurrences: Option<Vec<Vec<u32>>>,
    /// Stamp of this pattern's live heap entry (0 = not on the heap).
    heap_stamp: u64,
}

impl Pattern {
    pub fn new(key: Vec<u8>, cost: u32, freq: u32) -> Self {
        let savings = naive_score(freq, cost);
        Self {
            key,
            cost,
            freq,
            savings,
            occurrences: None,
            heap_stamp: 0,
        }
    }

    /// Drop the occurrence lists; the next rescore rebuilds them.
    pub fn invalidate_occurrences(&mut self) {
        self.occurrences = None;
    }
}

/// Savings of replacing every one of `freq` occurrences with a 2-z-char
/// reference, minus the once-rounded storage of the abbreviation itself.
pub fn naive_score(freq: u32, cost: u32) -> i64 {
    let cost = cost as i64;
    freq as i64 * (cost - 2) - 3 * ((cost + 2) / 3)
}

/// Arena of every pattern created during a run.
#[derive(Debug, Default)]
pub struct PatternStore {
    patterns: Vec<Pattern>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: Pattern) -> PatternId {
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Index<PatternId> for PatternStore {
    type Output = Pattern;

    fn index(&self, id: PatternId) -> &Pattern {
        &self.patterns[id]
    }
}

impl IndexMut<PatternId> for PatternStore {
    fn index_mut(&mut self, id: PatternId) -> &mut Pattern {
        &mut self.patterns[id]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    score: i64,
    stamp: u64,
    id: PatternId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on score; equal scores pop in insertion order.
        self.score
            .cmp(&other.score)
            .then_with(|| other.stamp.cmp(&self.stamp))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of patterns keyed by their savings at push time.
///
/// A pattern has at most one live entry; pushing again supersedes the old
/// entry, which is skipped when it eventually surfaces.
#[derive(Debug, Default)]
pub struct ScoreHeap {
    entries: BinaryHeap<HeapEntry>,
    next_stamp: u64,
}

impl ScoreHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a pattern keyed by its current savings.
    pub fn push(&mut self, store: &mut PatternStore, id: PatternId) {
        self.next_stamp += 1;
        store[id].heap_stamp = self.next_stamp;
        self.entries.push(HeapEntry {
            score: store[id].savings,
            stamp: self.next_stamp,
            id,
        });
    }

    /// Pop the highest-scored live pattern.
    pub fn pop(&mut self, store: &mut PatternStore) -> Option<PatternId> {
        while let Some(entry) = self.entries.pop() {
            if store[entry.id].heap_stamp == entry.stamp {
                store[entry.id].heap_stamp = 0;
                return Some(entry.id);
            }
        }
        None
    }

    /// Score of the highest live entry, discarding stale ones.
    pub fn peek_score(&mut self, store: &PatternStore) -> Option<i64> {
        loop {
            let entry = *self.entries.peek()?;
            if store[entry.id].heap_stamp == entry.stamp {
                return Some(entry.score);
            }
            self.entries.pop();
        }
    }

    pub fn is_exhausted(&mut self, store: &PatternStore) -> bool {
        self.peek_score(store).is_none()
    }
}
