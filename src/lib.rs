//! # zabbrev - Z-machine abbreviation selection
//!
//! zabbrev computes a near-optimal set of abbreviation strings for
//! Z-machine interactive-fiction compilers. Game text is encoded as 5-bit
//! z-characters packed three per word; a game may define up to 96
//! abbreviations, each referenced by a 2-z-character escape, and choosing
//! them well dominates final game size.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`zscii`] - Alphabet tables and the z-character cost model
//! - [`corpus`] - Flagged string records and ingestion bookkeeping
//! - [`index`] - Generalized suffix array + LCP over the corpus
//! - [`extract`] - Repeated-substring enumeration and scoring
//! - [`rescore`] - Optimal-parse rescoring (Wagner's dynamic program)
//! - [`select`] - Greedy selection with reinsertion, rounding-aware refinement
//! - [`input`] - ZAP / Inform6 transcript / Infodump+TXD readers
//! - [`output`] - `.FSTR` and `Abbreviate` emitters
//! - [`utils`] - Encoding detection, progress bars
//!
//! ## Quick Start
//!
//! ```ignore
//! use zabbrev::input::{self, InputOptions};
//! use zabbrev::rescore::EncodingParams;
//! use zabbrev::select::{run_selection, SelectionOptions};
//! use zabbrev::zscii::Alphabet;
//! use std::path::Path;
//!
//! let (mut corpus, _dialect) =
//!     input::load(Path::new("game/"), &InputOptions::default()).unwrap();
//! let params = EncodingParams::new(Alphabet::default(), 3, false);
//! let outcome =
//!     run_selection(&mut corpus, &params, &SelectionOptions::default()).unwrap();
//! for a in &outcome.abbreviations {
//!     println!("{:?}: {} uses", a.key, a.freq);
//! }
//! ```
//!
//! ## Pipeline
//!
//! Candidates come from one pass over the suffix/LCP arrays. A max-heap
//! keyed on naive savings drives greedy selection, with every pick
//! re-evaluated by a full optimal parse of the corpus; the refinement
//! stages then trade z-character savings against the Z-machine's per-string
//! padding until the byte total stops improving.

pub mod corpus;
pub mod extract;
pub mod index;
pub mod input;
pub mod output;
pub mod pattern;
pub mod rescore;
pub mod select;
pub mod utils;
pub mod zscii;
