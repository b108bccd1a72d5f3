//! Inform6 transcript reader.
//!
//! `inform6 -r $TRANSCRIPT_FORMAT=1` writes `gametext.txt` with one `X:text`
//! record per line. Indexed tags:
//!
//! - `G`, `V`, `S` - packed high-memory strings
//! - `O` - object descriptions (the first four are the `Class`/`Object`/
//!   `Routine`/`String` metaclass artifacts, defined before the abbreviation
//!   table exists, and are skipped)
//! - `H` - inline string inside the current routine
//! - `L`, `W` - other low strings and dictionary words
//!
//! `I:` metadata lines carry the compiled z-machine version and, per
//! routine, the code size excluding inline strings; each size line closes
//! the current routine id. The transcript already uses `^` and `~` for
//! newline and quote, so only spaces need sentinel substitution.

use crate::corpus::Corpus;
use crate::utils::encoding::{decode_to_latin1, Charset};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Object records emitted before user code; always metaclass artifacts.
const METACLASS_OBJECTS: u32 = 4;

pub fn read_transcript(path: &Path, charset: Charset, corpus: &mut Corpus) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let data = decode_to_latin1(&raw, charset);
    parse_transcript(&data, corpus);
    Ok(())
}

/// Parse one decoded transcript.
pub fn parse_transcript(data: &[u8], corpus: &mut Corpus) {
    let mut objects_seen = 0u32;
    let mut routine_id = 0u32;

    for line in data.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.len() < 2 || line[1] != b':' {
            continue;
        }
        let text = &line[2..];

        match line[0] {
            b'G' | b'V' | b'S' => {
                corpus.add_string(text, true, false, None);
            }
            b'L' | b'W' => {
                corpus.add_string(text, false, false, None);
            }
            b'O' => {
                objects_seen += 1;
                if objects_seen > METACLASS_OBJECTS {
                    corpus.add_string(text, false, true, None);
                }
            }
            b'H' => {
                corpus.add_string(text, false, false, Some(routine_id));
            }
            b'I' => parse_metadata(text, corpus, &mut routine_id),
            _ => {}
        }
    }

    debug!(
        "transcript: {} strings, {} routines",
        corpus.len(),
        routine_id
    );
}

fn parse_metadata(text: &[u8], corpus: &mut Corpus, routine_id: &mut u32) {
    if let Some(rest) = find_after(text, b"Compiled Z-machine version ") {
        match leading_int(rest) {
            Some(v @ 1..=8) => corpus.zversion = Some(v as u8),
            _ => warn!("unparseable z-machine version in transcript"),
        }
        return;
    }

    if let Some(rest) = find_after(text, b"without inline strings size:") {
        if let Some(size) = leading_int(rest) {
            corpus.add_routine_size(*routine_id, size as u32);
            *routine_id += 1;
        } else {
            warn!("unparseable routine size in transcript");
        }
    }
}

/// The slice just past the first occurrence of `needle`.
fn find_after<'a>(haystack: &'a [u8], needle: &[u8]) -> Option<&'a [u8]> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| &haystack[i + needle.len()..])
}

fn leading_int(bytes: &[u8]) -> Option<i64> {
    let s: String = bytes
        .iter()
        .map(|&b| b as char)
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    s.parse().ok()
}
