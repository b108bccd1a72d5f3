//! End-to-end selection scenarios over small fixed corpora.

use zabbrev::corpus::Corpus;
use zabbrev::input::{self, InputOptions};
use zabbrev::output::{self, OutputDialect};
use zabbrev::rescore::EncodingParams;
use zabbrev::select::{run_selection, SelectionOptions};
use zabbrev::zscii::{custom::build_custom_alphabet, Alphabet};

fn corpus_of(strings: &[&str]) -> Corpus {
    let mut corpus = Corpus::new();
    for s in strings {
        corpus.add_string(s.as_bytes(), false, false, None);
    }
    corpus
}

fn default_params() -> EncodingParams {
    EncodingParams::new(Alphabet::default(), 3, false)
}

#[test]
fn trivial_repeat_selects_nothing() {
    // Best candidate is "the " with freq 2, cost 4: naive score
    // 2*(4-2) - 3*ceil(4/3) = -2, so the heap never admits it.
    let mut corpus = corpus_of(&["the cat sat", "the dog ran"]);
    let outcome = run_selection(
        &mut corpus,
        &default_params(),
        &SelectionOptions {
            count: 1,
            level: 0,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(outcome.abbreviations.is_empty());
    assert_eq!(outcome.bytes_before, outcome.bytes_after);
}

#[test]
fn overlapping_winner_collapses_after_reparse() {
    // "abcdabcd" enters the heap with naive score 3 (freq 2 counting the
    // overlap), but the optimal parse can only use it once; its recomputed
    // score goes non-positive and the selection ends empty with the heap
    // drained.
    let mut corpus = corpus_of(&["abcdabcdabcd"]);
    let outcome = run_selection(
        &mut corpus,
        &default_params(),
        &SelectionOptions {
            count: 1,
            level: 0,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(outcome.abbreviations.is_empty());
}

#[test]
fn productive_corpus_saves_bytes() {
    let lines = [
        "You can see a small mailbox here.",
        "You can see a white house here.",
        "You can see a rubber mat here.",
        "Opening the small mailbox reveals a leaflet.",
        "Opening the white house is not possible.",
    ];
    let mut corpus = corpus_of(&lines);
    let outcome = run_selection(
        &mut corpus,
        &default_params(),
        &SelectionOptions {
            count: 8,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(!outcome.abbreviations.is_empty());
    assert!(outcome.bytes_after < outcome.bytes_before);
    for a in &outcome.abbreviations {
        assert!(a.key.len() >= 2);
        assert!(a.freq > 0);
    }
}

#[test]
fn boundary_refinement_never_loses_bytes() {
    let lines = [
        "hello world", "hello there", "hello world again", "why hello there",
    ];
    let mut base = corpus_of(&lines);
    let flat = run_selection(
        &mut base,
        &default_params(),
        &SelectionOptions {
            count: 3,
            level: 0,
            ..Default::default()
        },
    )
    .unwrap();

    let mut refined_corpus = corpus_of(&lines);
    let refined = run_selection(
        &mut refined_corpus,
        &default_params(),
        &SelectionOptions {
            count: 3,
            level: 1,
            ..Default::default()
        },
    )
    .unwrap();

    assert!(refined.bytes_after <= flat.bytes_after);
}

#[test]
fn deep_refinement_never_loses_bytes() {
    let lines = [
        "the troll swings his axe at you",
        "the troll swings and misses",
        "the axe crashes against the wall",
        "you dodge as the troll swings",
    ];
    let mut base = corpus_of(&lines);
    let flat = run_selection(
        &mut base,
        &default_params(),
        &SelectionOptions {
            count: 4,
            level: 0,
            ..Default::default()
        },
    )
    .unwrap();

    let mut deep_corpus = corpus_of(&lines);
    let deep = run_selection(
        &mut deep_corpus,
        &default_params(),
        &SelectionOptions {
            count: 4,
            level: 3,
            passes: 200,
            deep_passes: 50,
            ..Default::default()
        },
    )
    .unwrap();

    assert!(deep.bytes_after <= flat.bytes_after);
}

#[test]
fn custom_alphabet_lowers_cost_of_shifted_text() {
    // Uppercase and '!' cost 2 under the default tables; a corpus drowning
    // in them pulls each into the custom A0 at cost 1.
    let mut corpus = Corpus::new();
    for _ in 0..40 {
        corpus.add_string(b"QUIZ! ZAP! JAZZ!", false, false, None);
    }
    corpus.add_string(b"plain filler words", false, false, None);

    let custom = build_custom_alphabet(&corpus.char_freq);
    let default_cost = corpus.plain_cost(&Alphabet::default());
    let custom_cost = corpus.plain_cost(&custom);
    assert!(
        custom_cost < default_cost,
        "custom {} vs default {}",
        custom_cost,
        default_cost
    );
}

#[test]
fn throwback_selection_stays_within_count() {
    let lines = [
        "north of the house there is a path",
        "south of the house there is a garden",
        "east of the house there is a forest",
        "west of the house there is a field",
    ];
    let mut corpus = corpus_of(&lines);
    let outcome = run_selection(
        &mut corpus,
        &default_params(),
        &SelectionOptions {
            count: 5,
            throwback: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(outcome.abbreviations.len() <= 5);
    assert!(outcome.bytes_after <= outcome.bytes_before);
}

#[test]
fn zap_game_dir_end_to_end() {
    use std::fs;
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("game.zap"),
        "\t.NEW 5\n\
         \t.GSTR STR?1,\"West of House You are standing in an open field.\"\n\
         \t.GSTR STR?2,\"West of House You are standing west of a house.\"\n\
         \tPRINTI \"standing in an open field\"\n",
    )
    .unwrap();

    let (mut corpus, dialect) = input::load(dir.path(), &InputOptions::default()).unwrap();
    assert_eq!(corpus.zversion, Some(5));

    let params = EncodingParams::new(Alphabet::default(), 5, false);
    let outcome = run_selection(
        &mut corpus,
        &params,
        &SelectionOptions {
            count: 4,
            ..Default::default()
        },
    )
    .unwrap();

    let mut buf = Vec::new();
    output::write_listing(&mut buf, dialect.into(), &outcome.abbreviations).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("WORDS::"));
    assert!(text.trim_end().ends_with(".ENDI"));
}

#[test]
fn inform_transcript_end_to_end() {
    use std::fs;
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("gametext.txt"),
        "I:[Compiled Z-machine version 5]\n\
         O:Class\nO:Object\nO:Routine\nO:String\n\
         O:brass lantern\n\
         G:You are standing in an open field west of a white house.\n\
         G:You are standing west of a white house with a boarded door.\n\
         H:standing in an open field\n\
         I:[Routine Main without inline strings size: 30 bytes]\n",
    )
    .unwrap();

    let (mut corpus, dialect) = input::load(dir.path(), &InputOptions::default()).unwrap();
    assert_eq!(corpus.zversion, Some(5));

    let params = EncodingParams::new(Alphabet::default(), 5, false);
    let outcome = run_selection(
        &mut corpus,
        &params,
        &SelectionOptions {
            count: 4,
            ..Default::default()
        },
    )
    .unwrap();

    let mut buf = Vec::new();
    output::write_listing(&mut buf, dialect.into(), &outcome.abbreviations).unwrap();
    let text = String::from_utf8(buf).unwrap();
    if !outcome.abbreviations.is_empty() {
        assert!(text.contains("Abbreviate \""));
    }
}

#[test]
fn only_refactor_reports_long_duplicates() {
    let phrase = "There is a deafening roar as the dam bursts open wide.";
    let first = format!("1 {}", phrase);
    let second = format!("2 {}", phrase);
    let mut corpus = corpus_of(&[&first, &second]);
    let outcome = run_selection(
        &mut corpus,
        &default_params(),
        &SelectionOptions {
            only_refactor: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(outcome.abbreviations.is_empty());
    assert!(!outcome.long_duplicates.is_empty());

    let mut buf = Vec::new();
    output::write_refactor_report(&mut buf, OutputDialect::Inform, &outcome.long_duplicates)
        .unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.lines().all(|l| l.starts_with('!')));
}
