//! Z-machine character cost model.
//!
//! Z-machine text is a stream of 5-bit z-characters, three to a 16-bit word.
//! Which of the three alphabets a character lives in decides how many
//! z-characters it costs to emit:
//!
//! - A0 (lowercase by default) and space: 1 z-character
//! - A1 (uppercase) and A2 (punctuation), plus newline and quote: 2
//!   (one shift + one table entry)
//! - anything else: 4 (shift, 10-bit escape pair, return)
//!
//! Costs drive every scoring decision in the crate, so membership is kept in
//! two 256-entry lookup tables over the Latin-1 byte domain, rebuilt whenever
//! the alphabet tables change.

pub mod custom;

/// Default A0 table (26 entries).
pub const DEFAULT_A0: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
/// Default A1 table (26 entries).
pub const DEFAULT_A1: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Default A2 table, 23 printable entries. Three of the 26 A2 slots are
/// reserved for the 10-bit escape, newline, and quote.
pub const DEFAULT_A2: &[u8] = b"0123456789.,!?_#'/\\-:()";

/// In-band replacement for space (Latin-1 middle dot).
pub const SPACE_SENTINEL: u8 = 0xB7;
/// In-band replacement for double quote.
pub const QUOTE_SENTINEL: u8 = b'~';
/// In-band replacement for line feed.
pub const NEWLINE_SENTINEL: u8 = b'^';
/// Placeholder for characters outside Latin-1. Never abbreviated.
pub const PLACEHOLDER: u8 = 0x01;

/// The three alphabet tables plus the derived per-byte cost indexes.
#[derive(Debug, Clone)]
pub struct Alphabet {
    a0: Vec<u8>,
    a1: Vec<u8>,
    a2: Vec<u8>,
    /// Bytes encodable as a single z-character (A0 plus the space sentinel).
    one_zchar: [bool; 256],
    /// Bytes needing a shift (A1, A2, quote and newline sentinels).
    two_zchar: [bool; 256],
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new(DEFAULT_A0.to_vec(), DEFAULT_A1.to_vec(), DEFAULT_A2.to_vec())
    }
}

impl Alphabet {
    /// Build an alphabet from explicit tables. Lengths must be 26/26/23.
    pub fn new(a0: Vec<u8>, a1: Vec<u8>, a2: Vec<u8>) -> Self {
        assert_eq!(a0.len(), 26, "A0 must have 26 entries");
        assert_eq!(a1.len(), 26, "A1 must have 26 entries");
        assert_eq!(a2.len(), 23, "A2 must have 23 entries");

        let mut alphabet = Self {
            a0,
            a1,
            a2,
            one_zchar: [false; 256],
            two_zchar: [false; 256],
        };
        alphabet.rebuild_index();
        alphabet
    }

    pub fn a0(&self) -> &[u8] {
        &self.a0
    }

    pub fn a1(&self) -> &[u8] {
        &self.a1
    }

    pub fn a2(&self) -> &[u8] {
        &self.a2
    }

    /// Recompute both membership indexes from the current tables.
    fn rebuild_index(&mut self) {
        self.one_zchar = [false; 256];
        self.two_zchar = [false; 256];

        for &b in &self.a0 {
            self.one_zchar[b as usize] = true;
        }
        self.one_zchar[SPACE_SENTINEL as usize] = true;

        for &b in self.a1.iter().chain(self.a2.iter()) {
            self.two_zchar[b as usize] = true;
        }
        // Newline and quote occupy reserved A2 slots whatever the tables say.
        self.two_zchar[QUOTE_SENTINEL as usize] = true;
        self.two_zchar[NEWLINE_SENTINEL as usize] = true;
    }

    /// Cost of one character in z-characters: 1, 2, or 4.
    #[inline]
    pub fn char_cost(&self, b: u8) -> u32 {
        if self.one_zchar[b as usize] {
            1
        } else if self.two_zchar[b as usize] {
            2
        } else {
            4
        }
    }

    /// Cost of a whole string: the plain sum over its characters.
    pub fn string_cost(&self, text: &[u8]) -> u32 {
        text.iter().map(|&b| self.char_cost(b)).sum()
    }
}

/// Rounding unit in z-characters for a packed (high-memory) string.
pub fn packed_round_unit(zversion: u8, force_r3: bool) -> u32 {
    if force_r3 {
        return 3;
    }
    match zversion {
        1..=3 => 3,
        4..=7 => 6,
        _ => 12,
    }
}

/// Byte alignment for routine starts (code padding unit).
pub fn routine_pad_unit(zversion: u8) -> u32 {
    match zversion {
        1..=3 => 2,
        4..=7 => 4,
        _ => 8,
    }
}
