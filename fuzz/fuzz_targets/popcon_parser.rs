#![no_main]

use libfuzzer_sys::fuzz_target;
use shimcov::popularity::{parse_popcon, parse_popularity_csv, PopconField};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed feeds must come back as errors, never panics
        let _ = parse_popcon(input, PopconField::Inst, "fuzz");
        let _ = parse_popcon(input, PopconField::Vote, "fuzz");
        let _ = parse_popularity_csv(input, "fuzz");
    }
});
