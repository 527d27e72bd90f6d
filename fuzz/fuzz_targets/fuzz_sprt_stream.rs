//! Structured fuzzing of the sequential test over arbitrary record streams.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mtbf_common::FailureRecord;
use mtbf_core::sprt::{evaluate, SprtPlan, SprtState};

#[derive(Debug, Arbitrary)]
struct Input {
    alpha: f64,
    beta: f64,
    ratio: f64,
    mtbf: f64,
    records: Vec<(f64, bool)>,
}

fuzz_target!(|input: Input| {
    let Ok(plan) = SprtPlan::new(input.alpha, input.beta, input.ratio, input.mtbf) else {
        return;
    };
    let records: Vec<FailureRecord> = input
        .records
        .iter()
        .filter(|(d, _)| d.is_finite() && *d >= 0.0)
        .map(|&(d, failed)| {
            if failed {
                FailureRecord::failure(d)
            } else {
                FailureRecord::censored(d)
            }
        })
        .collect();
    let outcome = evaluate(&plan, &records);
    assert_ne!(outcome.state, SprtState::Testing);
    if let Some(i) = outcome.decision_index {
        assert_eq!(i + 1, outcome.steps.len());
    }
});
