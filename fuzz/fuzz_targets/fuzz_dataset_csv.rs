//! Fuzz target for failure dataset CSV parsing.
//!
//! Accepted datasets must hold only finite, non-negative durations.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mtbf_common::parse_dataset;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(dataset) = parse_dataset(text) {
        for record in dataset.iter() {
            assert!(record.duration.is_finite() && record.duration >= 0.0);
        }
    }
});
