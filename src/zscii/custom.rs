//! Per-game alphabet construction.
//!
//! For z-version 5+ a game may carry its own A0/A1/A2 tables. Building them
//! from the corpus character histogram moves the most frequent characters
//! into the 1-z-char table, which shortens every string that uses them.

use super::{
    Alphabet, DEFAULT_A0, DEFAULT_A1, DEFAULT_A2, NEWLINE_SENTINEL, PLACEHOLDER, QUOTE_SENTINEL,
    SPACE_SENTINEL,
};

/// Size of the candidate pool: 26 + 26 + 23 table slots.
const POOL_SIZE: usize = 75;

/// Bytes that never occupy an alphabet slot.
fn is_reserved(b: u8) -> bool {
    b == SPACE_SENTINEL
        || b == QUOTE_SENTINEL
        || b == NEWLINE_SENTINEL
        || b == PLACEHOLDER
        || b == 27
}

/// Build a custom alphabet from a corpus character histogram.
///
/// The 75 most frequent characters form the pool. The top 26 become A0; the
/// remaining 49 fill A1+A2, keeping any retained default character at its
/// default position and filling the leftover slots in frequency order.
pub fn build_custom_alphabet(histogram: &[u64; 256]) -> Alphabet {
    let mut pool: Vec<u8> = (0u16..256)
        .map(|b| b as u8)
        .filter(|&b| histogram[b as usize] > 0 && !is_reserved(b))
        .collect();
    // Highest frequency first; byte value breaks exact ties deterministically.
    pool.sort_by(|&a, &b| {
        histogram[b as usize]
            .cmp(&histogram[a as usize])
            .then(a.cmp(&b))
    });
    pool.truncate(POOL_SIZE);

    // Small corpora may not populate all 75 slots; pad from the default
    // tables so the result is always well-formed.
    for &b in DEFAULT_A0.iter().chain(DEFAULT_A1).chain(DEFAULT_A2) {
        if pool.len() >= POOL_SIZE {
            break;
        }
        if !pool.contains(&b) {
            pool.push(b);
        }
    }

    let a0: Vec<u8> = pool[..26].to_vec();
    let rest = &pool[26..];

    let default_a1a2: Vec<u8> = DEFAULT_A1.iter().chain(DEFAULT_A2).copied().collect();
    let mut slots: Vec<Option<u8>> = vec![None; default_a1a2.len()];
    let mut leftover = Vec::new();

    for &c in rest {
        match default_a1a2.iter().position(|&d| d == c) {
            Some(p) if slots[p].is_none() => slots[p] = Some(c),
            _ => leftover.push(c),
        }
    }
    let mut leftover = leftover.into_iter();
    for slot in slots.iter_mut() {
        if slot.is_none() {
            *slot = leftover.next();
        }
    }
    debug_assert!(leftover.next().is_none());

    let filled: Vec<u8> = slots.into_iter().map(|s| s.unwrap()).collect();
    let a1 = filled[..26].to_vec();
    let a2 = filled[26..].to_vec();

    Alphabet::new(a0, a1, a2)
}
