//! Input adapters.
//!
//! Three read paths produce the same thing: a [`Corpus`] of flagged string
//! records.
//!
//! - [`zap`] - `.zap` assembly sources in a game directory
//! - [`inform`] - an Inform6 `gametext.txt` transcript
//! - [`txd`] - Infodump + TXD disassembly of a compiled story file

pub mod inform;
pub mod txd;
pub mod zap;

use crate::corpus::Corpus;
use crate::utils::encoding::Charset;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Source dialect, used to pick the default output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Zap,
    Inform,
}

/// How to locate and read the corpus.
#[derive(Debug, Clone)]
pub struct InputOptions {
    pub charset: Charset,
    /// Force the Inform transcript path.
    pub force_inform: bool,
    pub infodump: Option<PathBuf>,
    pub txd: Option<PathBuf>,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            charset: Charset::Auto,
            force_inform: false,
            infodump: None,
            txd: None,
        }
    }
}

/// Load the corpus from `path`, auto-detecting the input kind.
///
/// Explicit `--infodump`/`--txd` files win; otherwise a `gametext.txt` file
/// (given directly, found in the directory, or forced) selects the Inform
/// path; otherwise the directory is scanned for `.zap` sources.
pub fn load(path: &Path, opts: &InputOptions) -> Result<(Corpus, Dialect)> {
    let mut corpus = Corpus::new();

    if opts.infodump.is_some() || opts.txd.is_some() {
        txd::read(
            &mut corpus,
            opts.infodump.as_deref(),
            opts.txd.as_deref(),
            opts.charset,
        )?;
        return Ok((corpus, Dialect::Zap));
    }

    if path.is_file() {
        let is_transcript = opts.force_inform
            || path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case("gametext.txt"));
        if !is_transcript {
            bail!("unrecognized input file: {}", path.display());
        }
        inform::read_transcript(path, opts.charset, &mut corpus)?;
        return Ok((corpus, Dialect::Inform));
    }

    if !path.is_dir() {
        bail!("no such file or directory: {}", path.display());
    }

    let transcript = path.join("gametext.txt");
    if opts.force_inform || transcript.is_file() {
        inform::read_transcript(&transcript, opts.charset, &mut corpus)?;
        return Ok((corpus, Dialect::Inform));
    }

    let files = zap::read_game_dir(path, opts.charset, &mut corpus)?;
    if files == 0 {
        bail!("no .zap files in {}", path.display());
    }
    Ok((corpus, Dialect::Zap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_path_errors() {
        let err = load(Path::new("/nonexistent/game"), &InputOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no such file or directory"));
    }

    #[test]
    fn test_empty_dir_errors() {
        let dir = tempdir().unwrap();
        let err = load(dir.path(), &InputOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no .zap files"));
    }

    #[test]
    fn test_gametext_detected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gametext.txt"), "G:hello world\n").unwrap();
        let (corpus, dialect) = load(dir.path(), &InputOptions::default()).unwrap();
        assert_eq!(dialect, Dialect::Inform);
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_zap_dir_detected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("game.zap"),
            "\t.GSTR STR?1,\"hello world\"\n",
        )
        .unwrap();
        let (corpus, dialect) = load(dir.path(), &InputOptions::default()).unwrap();
        assert_eq!(dialect, Dialect::Zap);
        assert_eq!(corpus.len(), 1);
        assert!(corpus.strings[0].packed);
    }
}
