//! Wald sequential probability ratio test for a specified MTBF.
//!
//! H0: MTBF = m0 against H1: MTBF = m0/d. After `F` failures in cumulative
//! time `T` the probability ratio is
//!
//! ```text
//! PR = d^F · exp(T·(1 − d)/m0)
//! ```
//!
//! The specified MTBF is accepted once `PR < lower` and rejected once
//! `PR > upper`, with
//!
//! ```text
//! lower = β/(1 − α)
//! upper = (1 − β)/α · (d + 1)/(2d)
//! ```
//!
//! Comparisons run on `ln PR`, which stays finite on long streams.

use std::fs;
use std::path::Path;

use mtbf_common::{Error, FailureRecord, PlanId, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of points on the operating characteristic.
pub const OC_POINTS: usize = 50;
/// Default half-width of the `h` grid.
pub const OC_H_LIMIT: f64 = 2.0;

/// Below this `|h|` the operating characteristic uses its closed-form limit.
const H_ZERO: f64 = 1e-9;

/// Risk levels and hypotheses of one test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprtPlan {
    pub alpha: f64,
    pub beta: f64,
    pub discrimination_ratio: f64,
    pub specified_mtbf: f64,
}

/// Acceptance and rejection thresholds on the probability ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Boundaries {
    pub correction: f64,
    pub lower: f64,
    pub upper: f64,
}

/// `failures = intercept + slope · T` for the accept and reject lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionLines {
    pub accept_intercept: f64,
    pub reject_intercept: f64,
    pub slope: f64,
}

impl DecisionLines {
    pub fn accept_at(&self, duration: f64) -> f64 {
        self.accept_intercept + self.slope * duration
    }

    pub fn reject_at(&self, duration: f64) -> f64 {
        self.reject_intercept + self.slope * duration
    }
}

/// One point of the operating characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OcPoint {
    pub h: f64,
    /// True MTBF at this `h`.
    pub mtbf: f64,
    /// Probability of acceptance.
    pub pa: f64,
    /// Expected number of failures to a decision.
    pub expected_failures: f64,
    /// Expected test time per component.
    pub expected_time: f64,
}

fn open_unit(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(Error::InvalidParameter(format!(
            "{name} must be in (0, 1), got {value}"
        )));
    }
    Ok(())
}

fn component_count(components: usize) -> Result<f64> {
    if components == 0 {
        return Err(Error::InvalidParameter(
            "components must be at least 1, got 0".to_string(),
        ));
    }
    Ok(components as f64)
}

impl SprtPlan {
    pub fn new(alpha: f64, beta: f64, discrimination_ratio: f64, specified_mtbf: f64) -> Result<Self> {
        open_unit("alpha", alpha)?;
        open_unit("beta", beta)?;
        if !(discrimination_ratio.is_finite() && discrimination_ratio > 1.0) {
            return Err(Error::InvalidParameter(format!(
                "discrimination ratio must be > 1, got {discrimination_ratio}"
            )));
        }
        if !(specified_mtbf.is_finite() && specified_mtbf > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "specified MTBF must be positive, got {specified_mtbf}"
            )));
        }
        Ok(Self {
            alpha,
            beta,
            discrimination_ratio,
            specified_mtbf,
        })
    }

    pub fn boundaries(&self) -> Boundaries {
        let d = self.discrimination_ratio;
        let correction = (d + 1.0) / (2.0 * d);
        Boundaries {
            correction,
            lower: self.beta / (1.0 - self.alpha),
            upper: (1.0 - self.beta) / self.alpha * correction,
        }
    }

    pub fn log_probability_ratio(&self, duration: f64, failures: f64) -> f64 {
        let d = self.discrimination_ratio;
        failures * d.ln() + duration * (1.0 - d) / self.specified_mtbf
    }

    pub fn probability_ratio(&self, duration: f64, failures: f64) -> f64 {
        self.log_probability_ratio(duration, failures).exp()
    }

    pub fn decision_lines(&self) -> DecisionLines {
        let b = self.boundaries();
        let ln_d = self.discrimination_ratio.ln();
        DecisionLines {
            accept_intercept: b.lower.ln() / ln_d,
            reject_intercept: b.upper.ln() / ln_d,
            slope: (self.discrimination_ratio - 1.0) / (self.specified_mtbf * ln_d),
        }
    }

    /// Cumulative test time needed to accept with zero failures, divided
    /// over `components`.
    pub fn minimum_test_time(&self, components: usize) -> Result<f64> {
        let n = component_count(components)?;
        let lines = self.decision_lines();
        Ok(-lines.accept_intercept / lines.slope / n)
    }

    /// Probability of acceptance and expected time to decision over an
    /// evenly spaced `h` grid on `[-h_limit, h_limit]`.
    pub fn operating_characteristic(
        &self,
        components: usize,
        h_limit: f64,
        points: usize,
    ) -> Result<Vec<OcPoint>> {
        let n = component_count(components)?;
        let step = if points > 1 {
            2.0 * h_limit / (points - 1) as f64
        } else {
            0.0
        };
        Ok((0..points)
            .map(|i| self.oc_point(-h_limit + step * i as f64, n))
            .collect())
    }

    fn oc_point(&self, h: f64, components: f64) -> OcPoint {
        let d = self.discrimination_ratio;
        let m0 = self.specified_mtbf;
        let b = self.boundaries();
        let (ln_u, ln_l, ln_d) = (b.upper.ln(), b.lower.ln(), d.ln());

        let (mtbf, pa, expected_failures) = if h.abs() < H_ZERO {
            (
                m0 * ln_d / (d - 1.0),
                ln_u / (ln_u - ln_l),
                -ln_u * ln_l / (ln_d * ln_d),
            )
        } else {
            let mtbf = m0 * (d.powf(h) - 1.0) / (h * (d - 1.0));
            let pa = (b.upper.powf(h) - 1.0) / (b.upper.powf(h) - b.lower.powf(h));
            let er = m0 * (pa * (ln_u - ln_l) - ln_u) / (mtbf * (d - 1.0) - m0 * ln_d);
            (mtbf, pa, er)
        };
        OcPoint {
            h,
            mtbf,
            pa,
            expected_failures,
            expected_time: mtbf / components * expected_failures,
        }
    }
}

/// Test state; everything but `Testing` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprtState {
    Testing,
    Accepted,
    Rejected,
    Indeterminate,
}

impl SprtState {
    pub fn is_terminal(self) -> bool {
        self != SprtState::Testing
    }
}

impl std::fmt::Display for SprtState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SprtState::Testing => "testing",
            SprtState::Accepted => "accepted",
            SprtState::Rejected => "rejected",
            SprtState::Indeterminate => "indeterminate",
        };
        write!(f, "{s}")
    }
}

/// Cumulative totals after one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequentialStep {
    pub index: usize,
    pub cumulative_duration: f64,
    pub cumulative_failures: usize,
    pub probability_ratio: f64,
    pub state: SprtState,
}

/// Streaming test fed one record at a time.
#[derive(Debug, Clone)]
pub struct SequentialTest {
    plan: SprtPlan,
    boundaries: Boundaries,
    duration: f64,
    failures: usize,
    steps: Vec<SequentialStep>,
    state: SprtState,
}

/// Final result of a sequential test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprtOutcome {
    pub state: SprtState,
    /// Zero-based index of the deciding record.
    pub decision_index: Option<usize>,
    pub cumulative_duration: f64,
    pub cumulative_failures: usize,
    pub boundaries: Boundaries,
    pub decision_lines: DecisionLines,
    /// Steps up to and including the decision.
    pub steps: Vec<SequentialStep>,
}

impl SprtOutcome {
    /// Test duration in years spread over `components`.
    pub fn test_years(&self, components: usize, hours_per_year: f64) -> Result<f64> {
        let n = component_count(components)?;
        if !(hours_per_year.is_finite() && hours_per_year > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "operating hours per year must be positive, got {hours_per_year}"
            )));
        }
        Ok(self.cumulative_duration / hours_per_year / n)
    }
}

impl SequentialTest {
    pub fn new(plan: SprtPlan) -> Self {
        Self {
            boundaries: plan.boundaries(),
            plan,
            duration: 0.0,
            failures: 0,
            steps: Vec::new(),
            state: SprtState::Testing,
        }
    }

    pub fn state(&self) -> SprtState {
        self.state
    }

    pub fn steps(&self) -> &[SequentialStep] {
        &self.steps
    }

    /// Feed one record. Records arriving after a decision are ignored.
    pub fn observe(&mut self, record: &FailureRecord) -> SprtState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.duration += record.duration;
        if record.status.is_failure() {
            self.failures += 1;
        }
        let log_pr = self
            .plan
            .log_probability_ratio(self.duration, self.failures as f64);
        if log_pr < self.boundaries.lower.ln() {
            self.state = SprtState::Accepted;
        } else if log_pr > self.boundaries.upper.ln() {
            self.state = SprtState::Rejected;
        }
        self.steps.push(SequentialStep {
            index: self.steps.len(),
            cumulative_duration: self.duration,
            cumulative_failures: self.failures,
            probability_ratio: log_pr.exp(),
            state: self.state,
        });
        if self.state.is_terminal() {
            debug!(
                state = %self.state,
                index = self.steps.len() - 1,
                duration = self.duration,
                failures = self.failures,
                "sequential test decided"
            );
        }
        self.state
    }

    /// Close the stream; an undecided test becomes indeterminate.
    pub fn finish(mut self) -> SprtOutcome {
        let decision_index = if self.state.is_terminal() {
            self.steps.len().checked_sub(1)
        } else {
            self.state = SprtState::Indeterminate;
            None
        };
        SprtOutcome {
            state: self.state,
            decision_index,
            cumulative_duration: self.duration,
            cumulative_failures: self.failures,
            boundaries: self.boundaries,
            decision_lines: self.plan.decision_lines(),
            steps: self.steps,
        }
    }
}

/// Run the test over a whole record stream.
pub fn evaluate<'a, I>(plan: &SprtPlan, records: I) -> SprtOutcome
where
    I: IntoIterator<Item = &'a FailureRecord>,
{
    let mut test = SequentialTest::new(*plan);
    for record in records {
        if test.observe(record).is_terminal() {
            break;
        }
    }
    test.finish()
}

/// A named plan kept in a plan collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub id: PlanId,
    pub alpha: f64,
    pub beta: f64,
    pub discrimination_ratio: f64,
    pub specified_mtbf: f64,
}

impl TestPlan {
    pub fn new(id: PlanId, plan: SprtPlan) -> Self {
        Self {
            id,
            alpha: plan.alpha,
            beta: plan.beta,
            discrimination_ratio: plan.discrimination_ratio,
            specified_mtbf: plan.specified_mtbf,
        }
    }

    /// Validated SPRT parameters of this plan.
    pub fn sprt(&self) -> Result<SprtPlan> {
        SprtPlan::new(
            self.alpha,
            self.beta,
            self.discrimination_ratio,
            self.specified_mtbf,
        )
    }

    /// Exact float equality on every parameter.
    pub fn same_parameters(&self, other: &TestPlan) -> bool {
        self.alpha == other.alpha
            && self.beta == other.beta
            && self.discrimination_ratio == other.discrimination_ratio
            && self.specified_mtbf == other.specified_mtbf
    }
}

/// Outcome of checking a candidate plan against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanValidation {
    #[serde(rename = "iderror")]
    IdError,
    #[serde(rename = "paramerror")]
    ParamError,
    Pass,
}

impl std::fmt::Display for PlanValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanValidation::IdError => "iderror",
            PlanValidation::ParamError => "paramerror",
            PlanValidation::Pass => "pass",
        };
        write!(f, "{s}")
    }
}

/// Id collisions are reported before parameter collisions.
pub fn validate_plan(existing: &[TestPlan], candidate: &TestPlan) -> PlanValidation {
    if existing.iter().any(|p| p.id == candidate.id) {
        PlanValidation::IdError
    } else if existing.iter().any(|p| p.same_parameters(candidate)) {
        PlanValidation::ParamError
    } else {
        PlanValidation::Pass
    }
}

/// An ordered plan collection owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanRegistry {
    plans: Vec<TestPlan>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `plan` when it validates; the collection is unchanged otherwise.
    pub fn add(&mut self, plan: TestPlan) -> PlanValidation {
        let outcome = validate_plan(&self.plans, &plan);
        if outcome == PlanValidation::Pass {
            self.plans.push(plan);
        }
        outcome
    }

    pub fn get(&self, id: &str) -> Option<&TestPlan> {
        self.plans.iter().find(|p| p.id.as_str() == id)
    }

    pub fn plans(&self) -> &[TestPlan] {
        &self.plans
    }

    /// Parse a JSON array of plans, rejecting invalid parameters and
    /// duplicates.
    pub fn from_json(text: &str) -> Result<Self> {
        let plans: Vec<TestPlan> = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for plan in plans {
            if PlanId::parse(plan.id.as_str()).is_none() {
                return Err(Error::InvalidParameter(format!(
                    "invalid plan id '{}'",
                    plan.id
                )));
            }
            plan.sprt()?;
            let id = plan.id.clone();
            let outcome = registry.add(plan);
            if outcome != PlanValidation::Pass {
                return Err(Error::InvalidParameter(format!(
                    "plan collection entry '{id}' failed validation: {outcome}"
                )));
            }
        }
        Ok(registry)
    }

    /// Load from `path`; a missing file is an empty collection.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
