//! Infodump + TXD reader.
//!
//! For games without source, Infodump's `-io` listing supplies object
//! descriptions and TXD's `-ag` disassembly supplies the text: `PRINT` /
//! `PRINT_RET` operands in the code area are inline strings, everything
//! after `End of code` is a packed high-memory string. Both tools wrap long
//! strings across lines; a quote left open continues on the next line and
//! the break is rejoined with a single space.

use crate::corpus::Corpus;
use crate::utils::encoding::{decode_to_latin1, Charset};
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

pub fn read(
    corpus: &mut Corpus,
    infodump: Option<&Path>,
    txd: Option<&Path>,
    charset: Charset,
) -> Result<()> {
    if let Some(path) = infodump {
        read_infodump(path, charset, corpus)?;
    }
    if let Some(path) = txd {
        read_txd(path, charset, corpus)?;
    }
    Ok(())
}

/// Collects a quoted string that may span wrapped lines.
#[derive(Default)]
struct QuotedCollector {
    buf: Vec<u8>,
    active: bool,
}

impl QuotedCollector {
    /// Begin collecting at `line[start..]` (just past the opening quote).
    /// Returns the completed string if the quote closes on this line.
    fn begin(&mut self, line: &[u8], start: usize) -> Option<Vec<u8>> {
        self.buf.clear();
        self.active = true;
        self.feed(&line[start..])
    }

    /// Continue on the next line; the wrap becomes a single space.
    fn continue_line(&mut self, line: &[u8]) -> Option<Vec<u8>> {
        self.buf.push(b' ');
        self.feed(line)
    }

    fn feed(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        for &b in chunk {
            if b == b'"' {
                self.active = false;
                return Some(std::mem::take(&mut self.buf));
            }
            self.buf.push(b);
        }
        None
    }
}

fn read_infodump(path: &Path, charset: Charset, corpus: &mut Corpus) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let data = decode_to_latin1(&raw, charset);

    let mut collector = QuotedCollector::default();
    let before = corpus.len();

    for line in data.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if collector.active {
            if let Some(text) = collector.continue_line(line) {
                corpus.add_string(&text, false, true, None);
            }
            continue;
        }

        sniff_version(line, corpus);

        if let Some(at) = find_sub(line, b"Description: ") {
            if let Some(q) = line[at..].iter().position(|&b| b == b'"') {
                if let Some(text) = collector.begin(line, at + q + 1) {
                    corpus.add_string(&text, false, true, None);
                }
            }
        }
    }

    debug!("infodump: {} object descriptions", corpus.len() - before);
    Ok(())
}

fn read_txd(path: &Path, charset: Charset, corpus: &mut Corpus) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let data = decode_to_latin1(&raw, charset);

    let mut collector = QuotedCollector::default();
    let mut in_code = true;
    let mut packed_pending = false;
    let before = corpus.len();

    for line in data.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if collector.active {
            if let Some(text) = collector.continue_line(line) {
                corpus.add_string(&text, packed_pending, false, None);
            }
            continue;
        }

        if find_sub(line, b"End of code").is_some() {
            in_code = false;
            continue;
        }

        sniff_version(line, corpus);

        if in_code {
            // PRINT and PRINT_RET operands only; other opcodes have no text.
            let opcode = find_sub(line, b"PRINT_RET").or_else(|| find_sub(line, b"PRINT"));
            if let Some(at) = opcode {
                if let Some(q) = line[at..].iter().position(|&b| b == b'"') {
                    packed_pending = false;
                    if let Some(text) = collector.begin(line, at + q + 1) {
                        corpus.add_string(&text, false, false, None);
                    }
                }
            }
        } else if let Some(q) = line.iter().position(|&b| b == b'"') {
            packed_pending = true;
            if let Some(text) = collector.begin(line, q + 1) {
                corpus.add_string(&text, true, false, None);
            }
        }
    }

    debug!("txd: {} strings", corpus.len() - before);
    Ok(())
}

/// Pick up "... version N ..." headers until an input declares one.
fn sniff_version(line: &[u8], corpus: &mut Corpus) {
    if corpus.zversion.is_some() {
        return;
    }
    let at = match find_sub(line, b"ersion") {
        Some(at) => at,
        None => return,
    };
    for &b in &line[at..] {
        if b.is_ascii_digit() {
            let v = b - b'0';
            if (1..=8).contains(&v) {
                corpus.zversion = Some(v);
            }
            return;
        }
    }
}

fn find_sub(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + needle.len())
}
