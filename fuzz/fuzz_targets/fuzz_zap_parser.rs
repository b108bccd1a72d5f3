#![no_main]

use libfuzzer_sys::fuzz_target;
use zabbrev::corpus::Corpus;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the ZAP source parser
    let mut corpus = Corpus::new();
    zabbrev::input::zap::parse_source(data, &mut corpus);
});
