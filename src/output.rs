//! Output formatting for the selected abbreviation set.
//!
//! Two dialects: ZAP `.FSTR` blocks for ZIL toolchains and `Abbreviate`
//! directives for Inform6 sources. Sentinels are restored on the way out;
//! the quote becomes a doubled `""` in ZAP and stays `~` in Inform (where it
//! already is the in-source escape), and the newline stays `^` in both.

use crate::extract::LongDuplicate;
use crate::input::Dialect;
use crate::select::Abbreviation;
use crate::zscii::{PLACEHOLDER, QUOTE_SENTINEL, SPACE_SENTINEL};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Inform6 rejects abbreviations beyond this many characters.
const INFORM_MAX_ABBREV_LEN: usize = 64;

/// Output dialect, defaulting to the input's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDialect {
    Zap,
    Inform,
}

impl From<Dialect> for OutputDialect {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Zap => OutputDialect::Zap,
            Dialect::Inform => OutputDialect::Inform,
        }
    }
}

/// Restore sentinel bytes into displayable text for the given dialect.
pub fn display_text(key: &[u8], dialect: OutputDialect) -> String {
    let mut out = String::with_capacity(key.len());
    for &b in key {
        match b {
            SPACE_SENTINEL => out.push(' '),
            QUOTE_SENTINEL => match dialect {
                OutputDialect::Zap => out.push_str("\"\""),
                OutputDialect::Inform => out.push('~'),
            },
            PLACEHOLDER => out.push('?'),
            _ => out.push(char::from(b)),
        }
    }
    out
}

/// Emit the abbreviation listing in the requested dialect.
pub fn write_listing<W: Write>(
    out: &mut W,
    dialect: OutputDialect,
    abbreviations: &[Abbreviation],
) -> io::Result<()> {
    match dialect {
        OutputDialect::Zap => write_zap(out, abbreviations),
        OutputDialect::Inform => write_inform(out, abbreviations),
    }
}

/// ZAP dialect: `.FSTR` definitions, the `WORDS::` table, `.ENDI`.
fn write_zap<W: Write>(out: &mut W, abbreviations: &[Abbreviation]) -> io::Result<()> {
    for (k, a) in abbreviations.iter().enumerate() {
        writeln!(
            out,
            ".FSTR FSTR?{},\"{}\"\t\t; {}x{}, saved {}",
            k + 1,
            display_text(&a.key, OutputDialect::Zap),
            a.freq,
            a.cost,
            a.score
        )?;
    }
    writeln!(out, "WORDS::")?;
    for k in 1..=abbreviations.len() {
        writeln!(out, "\tFSTR?{}", k)?;
    }
    writeln!(out, ".ENDI")
}

/// Inform dialect: one `Abbreviate` directive per line.
fn write_inform<W: Write>(out: &mut W, abbreviations: &[Abbreviation]) -> io::Result<()> {
    for a in abbreviations {
        let text = display_text(&a.key, OutputDialect::Inform);
        if text.chars().count() > INFORM_MAX_ABBREV_LEN {
            writeln!(
                out,
                "! Warning: Abbreviation too long ({} characters, Inform6 allows {})",
                text.chars().count(),
                INFORM_MAX_ABBREV_LEN
            )?;
            warn_stderr(&format!(
                "abbreviation \"{}\" exceeds the Inform6 limit of {} characters",
                text, INFORM_MAX_ABBREV_LEN
            ))?;
        }
        writeln!(
            out,
            "Abbreviate \"{}\";\t! {}x{}, saved {}",
            text, a.freq, a.cost, a.score
        )?;
    }
    Ok(())
}

/// Emit the long-duplicate report in the dialect's comment syntax.
pub fn write_refactor_report<W: Write>(
    out: &mut W,
    dialect: OutputDialect,
    duplicates: &[LongDuplicate],
) -> io::Result<()> {
    let comment = match dialect {
        OutputDialect::Zap => ';',
        OutputDialect::Inform => '!',
    };
    writeln!(
        out,
        "{} Long repeated strings; printing them from one routine would deduplicate the text:",
        comment
    )?;
    for d in duplicates {
        writeln!(
            out,
            "{} {:4}x ({:2} chars) \"{}\"",
            comment,
            d.freq,
            d.text.len(),
            display_text(&d.text, dialect)
        )?;
    }
    Ok(())
}

/// Yellow warning line on stderr.
pub fn warn_stderr(message: &str) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(stderr, "Warning: {}", message)?;
    stderr.reset()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbrev(key: &[u8], freq: u32, cost: u32, score: i64) -> Abbreviation {
        Abbreviation {
            key: key.to_vec(),
            freq,
            cost,
            score,
        }
    }

    #[test]
    fn test_display_text_restores_sentinels() {
        let key = vec![b't', b'h', b'e', SPACE_SENTINEL];
        assert_eq!(display_text(&key, OutputDialect::Zap), "the ");
        assert_eq!(display_text(&key, OutputDialect::Inform), "the ");

        let key = vec![QUOTE_SENTINEL, b'h', b'i', QUOTE_SENTINEL];
        assert_eq!(display_text(&key, OutputDialect::Zap), "\"\"hi\"\"");
        assert_eq!(display_text(&key, OutputDialect::Inform), "~hi~");
    }

    #[test]
    fn test_zap_listing_shape() {
        let abbrevs = vec![
            abbrev(&[b't', b'h', b'e', SPACE_SENTINEL], 52, 4, 98),
            abbrev(b"ou", 30, 2, 0),
        ];
        let mut buf = Vec::new();
        write_listing(&mut buf, OutputDialect::Zap, &abbrevs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(".FSTR FSTR?1,\"the \""));
        assert!(text.contains("; 52x4, saved 98"));
        assert!(text.contains("WORDS::"));
        assert!(text.contains("\tFSTR?2"));
        assert!(text.trim_end().ends_with(".ENDI"));
    }

    #[test]
    fn test_inform_listing_shape() {
        let abbrevs = vec![abbrev(&[b't', b'h', b'e', SPACE_SENTINEL], 52, 4, 98)];
        let mut buf = Vec::new();
        write_listing(&mut buf, OutputDialect::Inform, &abbrevs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Abbreviate \"the \";"));
        assert!(text.contains("! 52x4, saved 98"));
    }

    #[test]
    fn test_inform_long_abbreviation_warns() {
        let long_key = vec![b'x'; 70];
        let abbrevs = vec![abbrev(&long_key, 3, 70, 1)];
        let mut buf = Vec::new();
        write_listing(&mut buf, OutputDialect::Inform, &abbrevs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Warning: Abbreviation too long"));
    }

    #[test]
    fn test_refactor_report_comment_syntax() {
        let dups = vec![LongDuplicate {
            text: b"You can't do that here.".to_vec(),
            freq: 7,
        }];
        let mut zap = Vec::new();
        write_refactor_report(&mut zap, OutputDialect::Zap, &dups).unwrap();
        assert!(String::from_utf8(zap).unwrap().starts_with(';'));

        let mut inform = Vec::new();
        write_refactor_report(&mut inform, OutputDialect::Inform, &dups).unwrap();
        assert!(String::from_utf8(inform).unwrap().starts_with('!'));
    }
}
