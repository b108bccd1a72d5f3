//! ZAP assembly reader.
//!
//! Scans every `.zap` file in the game directory (skipping generated
//! `*_freq*` files) and captures the string operands of the four text
//! directives:
//!
//! - `.GSTR` - packed high-memory string
//! - `.STRL` - object description
//! - `PRINTI` / `PRINTR` - inline code string
//!
//! A doubled quote inside the operand is a single escaped quote. `.NEW n`
//! declares the z-machine version.

use crate::corpus::Corpus;
use crate::utils::encoding::{decode_to_latin1, Charset};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Read every eligible `.zap` file under `dir`. Returns the file count.
pub fn read_game_dir(dir: &Path, charset: Charset, corpus: &mut Corpus) -> Result<usize> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("cannot read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension().and_then(|e| e.to_str()) == Some("zap")
                && !p
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.contains("_freq"))
        })
        .collect();
    paths.sort();

    for path in &paths {
        let raw = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let data = decode_to_latin1(&raw, charset);
        let before = corpus.len();
        parse_source(&data, corpus);
        debug!(
            "{}: {} strings",
            path.display(),
            corpus.len() - before
        );
    }

    Ok(paths.len())
}

/// Parse one decoded `.zap` source.
pub fn parse_source(data: &[u8], corpus: &mut Corpus) {
    for line in data.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        parse_line(line, corpus);
    }
}

fn parse_line(line: &[u8], corpus: &mut Corpus) {
    let trimmed = trim_start(line);

    if let Some(rest) = strip_prefix(trimmed, b".NEW") {
        if let Some(version) = parse_int(rest) {
            if (1..=8).contains(&version) {
                corpus.zversion = Some(version as u8);
            } else {
                warn!(".NEW declares unsupported version {}", version);
            }
        }
        return;
    }

    let (packed, object_desc) = if strip_prefix(trimmed, b".GSTR").is_some() {
        (true, false)
    } else if strip_prefix(trimmed, b".STRL").is_some() {
        (false, true)
    } else if strip_prefix(trimmed, b"PRINTI").is_some()
        || strip_prefix(trimmed, b"PRINTR").is_some()
    {
        (false, false)
    } else {
        return;
    };

    if let Some(text) = capture_quoted(trimmed) {
        corpus.add_string(&text, packed, object_desc, None);
    }
}

/// The quoted operand with `""` collapsed to one quote, or `None` when the
/// quote never closes on this line.
fn capture_quoted(line: &[u8]) -> Option<Vec<u8>> {
    let start = line.iter().position(|&b| b == b'"')? + 1;
    let mut out = Vec::new();
    let mut i = start;
    while i < line.len() {
        if line[i] == b'"' {
            if line.get(i + 1) == Some(&b'"') {
                out.push(b'"');
                i += 2;
            } else {
                return Some(out);
            }
        } else {
            out.push(line[i]);
            i += 1;
        }
    }
    None
}

fn trim_start(line: &[u8]) -> &[u8] {
    let skip = line
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    &line[skip..]
}

fn strip_prefix<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    if line.starts_with(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    let s: String = bytes
        .iter()
        .map(|&b| b as char)
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_capture_quoted() {
        assert_eq!(
            capture_quoted(b".GSTR STR?1,\"hello\""),
            Some(b"hello".to_vec())
        );
        assert_eq!(
            capture_quoted(b".GSTR STR?1,\"say \"\"hi\"\" now\""),
            Some(b"say \"hi\" now".to_vec())
        );
        assert_eq!(capture_quoted(b".GSTR STR?1,\"unterminated"), None);
        assert_eq!(capture_quoted(b"no quotes here"), None);
    }

    #[test]
    fn test_directive_flags() {
        let mut corpus = Corpus::new();
        parse_source(
            b"\t.GSTR STR?1,\"global\"\n\
              \t.STRL \"object desc\"\n\
              \tPRINTI \"inline text\"\n\
              \tPRINTR \"inline ret\"\n\
              \tADD X,Y\n",
            &mut corpus,
        );
        assert_eq!(corpus.len(), 4);
        assert!(corpus.strings[0].packed);
        assert!(!corpus.strings[0].object_desc);
        assert!(corpus.strings[1].object_desc);
        assert!(!corpus.strings[1].packed);
        assert!(!corpus.strings[2].packed);
        assert!(!corpus.strings[3].packed);
    }

    #[test]
    fn test_new_directive_sets_version() {
        let mut corpus = Corpus::new();
        parse_source(b"\t.NEW 5\n", &mut corpus);
        assert_eq!(corpus.zversion, Some(5));
    }

    #[test]
    fn test_freq_files_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("game.zap"), "\t.GSTR S,\"one\"\n").unwrap();
        fs::write(
            dir.path().join("game_freq.zap"),
            "\t.GSTR S,\"generated\"\n",
        )
        .unwrap();
        let mut corpus = Corpus::new();
        let count = read_game_dir(dir.path(), Charset::Auto, &mut corpus).unwrap();
        assert_eq!(count, 1);
        assert_eq!(corpus.len(), 1);
    }
}
