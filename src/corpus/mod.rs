//! The text corpus: one record per game string.
//!
//! Strings arrive from the input adapters with their storage class already
//! known (packed high-memory string, object description, or inline code
//! string). On ingestion the three in-band sentinels are substituted so the
//! rest of the crate never sees a raw space, quote, or line feed, and the
//! per-string scratch used by the rescorer is allocated once up front.

use crate::zscii::{Alphabet, NEWLINE_SENTINEL, QUOTE_SENTINEL, SPACE_SENTINEL};
use ahash::AHashMap;
use log::warn;

/// Separator used when corpus strings are concatenated for indexing. An
/// ASCII control byte that cannot survive ingestion (it is stripped with a
/// warning if an input file somehow contains it).
pub const SEPARATOR: u8 = 0x0B;

/// One source text unit with its storage class and rescore scratch.
#[derive(Debug, Clone)]
pub struct GameString {
    /// Sentinel-substituted Latin-1 text.
    pub text: Vec<u8>,
    /// Stored in high memory behind a packed address.
    pub packed: bool,
    /// Object (short name) description.
    pub object_desc: bool,
    /// Routine this inline string belongs to, for code-padding accounting.
    pub routine_id: Option<u32>,
    /// Minimum encoding cost from index i to the end, in z-characters.
    /// Length |text|+2; mutated in place by every rescore.
    pub cost_from: Vec<u32>,
    /// Candidate-set index chosen at index i, or -1. Length |text|+1.
    pub choice_at: Vec<i32>,
    /// Results of the last rescore.
    pub min_cost: u32,
    pub rounding: u32,
    pub bytes: u32,
}

impl GameString {
    fn new(text: Vec<u8>, packed: bool, object_desc: bool, routine_id: Option<u32>) -> Self {
        let n = text.len();
        Self {
            text,
            packed,
            object_desc,
            routine_id,
            cost_from: vec![0; n + 2],
            choice_at: vec![-1; n + 1],
            min_cost: 0,
            rounding: 0,
            bytes: 0,
        }
    }
}

/// The full text corpus plus ingestion-time bookkeeping.
#[derive(Debug)]
pub struct Corpus {
    pub strings: Vec<GameString>,
    /// Z-machine version declared by the input, if any.
    pub zversion: Option<u8>,
    /// Routine id -> code size in bytes excluding inline strings.
    pub routine_sizes: AHashMap<u32, u32>,
    /// Character histogram over ingested text, sentinels and ZSCII escape
    /// byte excluded. Feeds the custom-alphabet builder.
    pub char_freq: [u64; 256],
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            zversion: None,
            routine_sizes: AHashMap::new(),
            char_freq: [0; 256],
        }
    }

    /// Add one string. `raw` is Latin-1 text that may still contain spaces,
    /// quotes, and line feeds; the sentinels are substituted here. Empty
    /// strings are dropped.
    ///
    /// Returns `true` if the string was added.
    pub fn add_string(
        &mut self,
        raw: &[u8],
        packed: bool,
        object_desc: bool,
        routine_id: Option<u32>,
    ) -> bool {
        if raw.is_empty() {
            return false;
        }

        let mut text = Vec::with_capacity(raw.len());
        for &b in raw {
            let b = match b {
                b' ' => SPACE_SENTINEL,
                b'"' => QUOTE_SENTINEL,
                b'\n' => NEWLINE_SENTINEL,
                SEPARATOR => {
                    warn!("input text contains separator byte 0x0B; stripped");
                    continue;
                }
                other => other,
            };
            text.push(b);
        }
        if text.is_empty() {
            return false;
        }

        for &b in &text {
            if b != SPACE_SENTINEL && b != QUOTE_SENTINEL && b != NEWLINE_SENTINEL && b != 27 {
                self.char_freq[b as usize] += 1;
            }
        }

        self.strings
            .push(GameString::new(text, packed, object_desc, routine_id));
        true
    }

    /// Record the code size of a routine (bytes, inline strings excluded).
    pub fn add_routine_size(&mut self, routine_id: u32, size: u32) {
        self.routine_sizes.insert(routine_id, size);
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Total unabbreviated cost of the corpus in z-characters under an
    /// alphabet. Used to report custom-alphabet savings.
    pub fn plain_cost(&self, alphabet: &Alphabet) -> u64 {
        self.strings
            .iter()
            .map(|s| alphabet.string_cost(&s.text) as u64)
            .sum()
    }
}
