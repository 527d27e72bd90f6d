//! Fuzz target for plan collection files.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mtbf_core::sprt::PlanRegistry;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(registry) = PlanRegistry::from_json(text) {
        // every loaded plan builds a valid test
        for plan in registry.plans() {
            assert!(plan.sprt().is_ok());
        }
    }
});
