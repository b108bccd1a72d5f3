//! Source-encoding detection.
//!
//! Input files are ASCII, Latin-1, or UTF-8; the corpus itself is a Latin-1
//! byte view. Detection is strict UTF-8 decode with Latin-1 fallback; code
//! points beyond Latin-1 collapse to a placeholder byte that the extractor
//! refuses to abbreviate.

use crate::zscii::PLACEHOLDER;
use ahash::AHashSet;
use log::{debug, warn};

/// Character-set handling for input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Strict UTF-8 first, Latin-1 on failure.
    Auto,
    /// Treat bytes as ASCII (passed through unchanged).
    Ascii,
    /// Force UTF-8 (invalid sequences fall back to Latin-1).
    Utf8,
    /// Force Latin-1.
    Latin1,
}

/// Decode raw file bytes into the corpus Latin-1 view.
pub fn decode_to_latin1(raw: &[u8], charset: Charset) -> Vec<u8> {
    match charset {
        Charset::Ascii | Charset::Latin1 => raw.to_vec(),
        Charset::Utf8 | Charset::Auto => match std::str::from_utf8(raw) {
            Ok(text) => utf8_to_latin1(text),
            Err(_) => {
                if charset == Charset::Utf8 {
                    warn!("input is not valid UTF-8; reading as Latin-1");
                } else {
                    debug!("input is not valid UTF-8; reading as Latin-1");
                }
                raw.to_vec()
            }
        },
    }
}

fn utf8_to_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut reported: AHashSet<char> = AHashSet::new();
    for c in text.chars() {
        if c == '\u{feff}' {
            continue; // BOM
        }
        let code = c as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            if reported.insert(c) {
                warn!("character {:?} (U+{:04X}) is outside Latin-1 and will not be abbreviated", c, code);
            }
            out.push(PLACEHOLDER);
        }
    }
    out
}
