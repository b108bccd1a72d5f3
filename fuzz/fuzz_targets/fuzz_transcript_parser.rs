#![no_main]

use libfuzzer_sys::fuzz_target;
use zabbrev::corpus::Corpus;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the transcript parser
    let mut corpus = Corpus::new();
    zabbrev::input::inform::parse_transcript(data, &mut corpus);
});
