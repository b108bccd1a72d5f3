mod corpus;
mod extract;
mod index;
mod input;
mod output;
mod pattern;
mod rescore;
mod select;
mod utils;
mod zscii;

use anyhow::Result;
use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use input::{Dialect, InputOptions};
use output::OutputDialect;
use rescore::EncodingParams;
use select::{SelectionOptions, SelectionOutcome};
use utils::encoding::Charset;
use zscii::{custom::build_custom_alphabet, Alphabet, DEFAULT_A0, DEFAULT_A1, DEFAULT_A2};

#[derive(Parser)]
#[command(name = "zabbrev")]
#[command(about = "Computes a near-optimal abbreviation set for Z-machine games")]
#[command(version)]
struct Cli {
    /// Game directory (.zap sources) or an Inform6 gametext.txt transcript
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Number of abbreviations to select
    #[arg(short = 'n', long = "abbreviations", default_value = "96")]
    abbreviations: usize,

    /// Build a custom alphabet from corpus character frequencies (z5+)
    #[arg(short = 'a', long = "custom-alphabet")]
    custom_alphabet: bool,

    /// Explicit A0 table (26 characters)
    #[arg(long, value_name = "CHARS")]
    a0: Option<String>,

    /// Explicit A1 table (26 characters)
    #[arg(long, value_name = "CHARS")]
    a1: Option<String>,

    /// Explicit A2 table (23 characters)
    #[arg(long, value_name = "CHARS")]
    a2: Option<String>,

    /// Force rounding unit 3 for packed strings regardless of z-version
    #[arg(long = "r3")]
    force_r3: bool,

    /// Z-machine version 1-8 (auto-detected from the input when omitted)
    #[arg(short = 'z', long = "zversion", value_parser = clap::value_parser!(u8).range(1..=8))]
    zversion: Option<u8>,

    /// Compression level: 0 none, 1 boundary, 2 +replacement, 3 deep
    #[arg(short = 'x', long = "compression", default_value = "1",
          value_parser = clap::value_parser!(u8).range(0..=3))]
    compression: u8,

    /// Replacement-pass budget at levels 2-3
    #[arg(long, default_value = "10000")]
    passes: u32,

    /// Deep replacement budget at level 3
    #[arg(long = "deep-passes", default_value = "1000")]
    deep_passes: u32,

    /// Throw already-selected low scorers back for another chance
    #[arg(short = 'b', long = "throwback")]
    throwback: bool,

    /// Output dialect: input (match the source), inform, or zap (also 0/1/2)
    #[arg(short = 'o', long = "output-format", default_value = "input", value_name = "DIALECT")]
    output_format: String,

    /// Emit the long-duplicate report instead of selecting abbreviations
    #[arg(long = "only-refactor", alias = "onlyrefactor")]
    only_refactor: bool,

    /// Force Inform6 transcript input
    #[arg(short = 'i', long = "inform")]
    inform: bool,

    /// Infodump -io output (object descriptions)
    #[arg(long, value_name = "FILE")]
    infodump: Option<PathBuf>,

    /// TXD -ag output (code and high strings)
    #[arg(long, value_name = "FILE")]
    txd: Option<PathBuf>,

    /// Character set override: 0 ascii, u utf-8, 1 latin-1
    #[arg(short = 'c', long = "charset", value_name = "SET")]
    charset: Option<String>,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Trace logging plus a JSON selection report on stderr
    #[arg(long)]
    debug: bool,
}

#[derive(Serialize)]
struct ReportEntry {
    text: String,
    freq: u32,
    cost: u32,
    score: i64,
}

#[derive(Serialize)]
struct SelectionReport {
    zversion: u8,
    abbreviation_count: usize,
    bytes_before: u64,
    bytes_after: u64,
    bytes_saved: u64,
    alphabet_savings: Option<i64>,
    abbreviations: Vec<ReportEntry>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let charset = parse_charset(cli.charset.as_deref());
    let (mut corpus, dialect) = input::load(
        &cli.path,
        &InputOptions {
            charset,
            force_inform: cli.inform,
            infodump: cli.infodump.clone(),
            txd: cli.txd.clone(),
        },
    )?;

    let zversion = cli.zversion.or(corpus.zversion).unwrap_or_else(|| {
        info!("z-version not declared by the input; assuming 3");
        3
    });

    let (alphabet, alphabet_savings) = resolve_alphabet(&cli, &corpus, zversion);
    let params = EncodingParams::new(alphabet, zversion, cli.force_r3);

    let opts = SelectionOptions {
        count: cli.abbreviations,
        throwback: cli.throwback,
        level: cli.compression,
        passes: cli.passes,
        deep_passes: cli.deep_passes,
        only_refactor: cli.only_refactor,
    };
    let outcome = select::run_selection(&mut corpus, &params, &opts)?;

    let out_dialect = resolve_output_dialect(&cli.output_format, dialect);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.only_refactor {
        output::write_refactor_report(&mut out, out_dialect, &outcome.long_duplicates)?;
    } else {
        output::write_listing(&mut out, out_dialect, &outcome.abbreviations)?;
    }
    out.flush()?;

    print_summary(&outcome, zversion, alphabet_savings, cli.only_refactor);

    if cli.debug && !cli.only_refactor {
        let report = SelectionReport {
            zversion,
            abbreviation_count: outcome.abbreviations.len(),
            bytes_before: outcome.bytes_before,
            bytes_after: outcome.bytes_after,
            bytes_saved: outcome.bytes_before.saturating_sub(outcome.bytes_after),
            alphabet_savings,
            abbreviations: outcome
                .abbreviations
                .iter()
                .map(|a| ReportEntry {
                    text: output::display_text(&a.key, out_dialect),
                    freq: a.freq,
                    cost: a.cost,
                    score: a.score,
                })
                .collect(),
        };
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_default_env();
    if cli.debug {
        builder.filter_level(LevelFilter::Trace);
    } else if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }
    builder.format_timestamp(None).init();
}

/// Option errors degrade to defaults with a warning, never fatally.
fn parse_charset(arg: Option<&str>) -> Charset {
    match arg {
        None => Charset::Auto,
        Some("0") | Some("ascii") => Charset::Ascii,
        Some("u") | Some("utf8") | Some("utf-8") => Charset::Utf8,
        Some("1") | Some("latin1") | Some("latin-1") => Charset::Latin1,
        Some(other) => {
            warn!("unknown charset {:?}; auto-detecting", other);
            Charset::Auto
        }
    }
}

fn resolve_output_dialect(arg: &str, input: Dialect) -> OutputDialect {
    match arg {
        "input" | "0" => input.into(),
        "inform" | "1" => OutputDialect::Inform,
        "zap" | "ZAP" | "2" => OutputDialect::Zap,
        other => {
            warn!("unknown output format {:?}; matching the input", other);
            input.into()
        }
    }
}

/// Pick the cost-model alphabet: explicit tables beat the frequency-built
/// custom alphabet, which beats the defaults. Returns the plain-cost delta
/// (default vs chosen) when a non-default alphabet is in play.
fn resolve_alphabet(cli: &Cli, corpus: &corpus::Corpus, zversion: u8) -> (Alphabet, Option<i64>) {
    if cli.a0.is_some() || cli.a1.is_some() || cli.a2.is_some() {
        let a0 = table_arg(cli.a0.as_deref(), 26, "--a0", DEFAULT_A0);
        let a1 = table_arg(cli.a1.as_deref(), 26, "--a1", DEFAULT_A1);
        let a2 = table_arg(cli.a2.as_deref(), 23, "--a2", DEFAULT_A2);
        let alphabet = Alphabet::new(a0, a1, a2);
        let savings = alphabet_delta(corpus, &alphabet);
        return (alphabet, Some(savings));
    }

    if cli.custom_alphabet {
        if zversion < 5 {
            warn!(
                "custom alphabet requested for z{}; interpreters need not honor it below z5",
                zversion
            );
        }
        let alphabet = build_custom_alphabet(&corpus.char_freq);
        let savings = alphabet_delta(corpus, &alphabet);
        info!("custom alphabet saves {} z-characters over the default", savings);
        return (alphabet, Some(savings));
    }

    (Alphabet::default(), None)
}

fn alphabet_delta(corpus: &corpus::Corpus, alphabet: &Alphabet) -> i64 {
    corpus.plain_cost(&Alphabet::default()) as i64 - corpus.plain_cost(alphabet) as i64
}

/// Validate an explicit alphabet argument, falling back to the default
/// table when the length is wrong or a character is outside Latin-1.
fn table_arg(arg: Option<&str>, want: usize, name: &str, default: &[u8]) -> Vec<u8> {
    let Some(s) = arg else {
        return default.to_vec();
    };
    let bytes: Option<Vec<u8>> = s
        .chars()
        .map(|c| u8::try_from(c as u32).ok())
        .collect();
    match bytes {
        Some(b) if b.len() == want => b,
        _ => {
            warn!(
                "{} must be exactly {} Latin-1 characters; using the default table",
                name, want
            );
            default.to_vec()
        }
    }
}

fn print_summary(
    outcome: &SelectionOutcome,
    zversion: u8,
    alphabet_savings: Option<i64>,
    only_refactor: bool,
) {
    if only_refactor {
        eprintln!("{} long repeated strings reported", outcome.long_duplicates.len());
        return;
    }
    eprintln!();
    eprintln!("z-version:        {}", zversion);
    eprintln!("abbreviations:    {}", outcome.abbreviations.len());
    eprintln!("text bytes before: {}", outcome.bytes_before);
    eprintln!("text bytes after:  {}", outcome.bytes_after);
    eprintln!(
        "bytes saved:       {}",
        outcome.bytes_before.saturating_sub(outcome.bytes_after)
    );
    if let Some(delta) = alphabet_savings {
        eprintln!("alphabet savings:  {} z-characters", delta);
    }
}
