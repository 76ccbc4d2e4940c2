//! Fuzz target for the `birdc` output parsers.
//!
//! Run with: cargo +nightly fuzz run fuzz_output_parser
//!
//! Every parser must accept any input without panicking.

#![no_main]

use birdwatch_core::parser::{BirdOutputParser, OutputParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let parser = BirdOutputParser;

    let _ = parser.status(&raw);
    let _ = parser.protocols(&raw);
    let _ = parser.routes(&raw);
    let _ = parser.routes_count(&raw);
    let _ = parser.symbols(&raw);
});
