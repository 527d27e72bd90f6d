//! Fuzz target for config.json parsing and semantic validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mtbf_config::{collect_issues, EngineConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = EngineConfig::parse_json(text) {
        let _ = collect_issues(&config);
    }
});
