//! Command payloads.

use mtbf_config::{ConfigSnapshot, EngineConfig, ValidationError};
use serde::Serialize;

use super::{num, table, Report};
use crate::cost::{CostComparison, PolicyParameters, RegimeCost};
use crate::distribution::LifetimeDistribution;
use crate::fit::FitReport;
use crate::simulate::{SimulationRun, Stats};
use crate::sprt::{
    Boundaries, DecisionLines, OcPoint, PlanValidation, SprtOutcome, SprtPlan, SprtState, TestPlan,
};

fn describe(dist: &LifetimeDistribution) -> String {
    format!(
        "{}(shape {}, scale {})",
        dist.family(),
        num(dist.shape()),
        num(dist.scale())
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct FitPayload {
    pub dataset: String,
    pub fit: FitReport,
    /// Mean of the fitted distribution.
    pub mean: f64,
}

impl Report for FitPayload {
    fn command(&self) -> &'static str {
        "fit"
    }

    fn markdown(&self) -> String {
        let f = &self.fit;
        let mut out = format!(
            "Dataset `{}`: {} records, {} failures.\n\n",
            self.dataset, f.records, f.failures
        );
        out.push_str(&table(
            &["family", "shape", "scale", "mean", "log-likelihood", "method", "iterations"],
            &[vec![
                f.family.to_string(),
                format!("{:.4}", f.shape),
                num(f.scale),
                num(self.mean),
                num(f.log_likelihood),
                f.method.to_string(),
                f.iterations.to_string(),
            ]],
        ));
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} shape={:.4} scale={:.1} via {} ({} records)",
            self.fit.family, self.fit.shape, self.fit.scale, self.fit.method, self.fit.records
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CostPayload {
    pub distribution: LifetimeDistribution,
    pub policy: PolicyParameters,
    pub comparison: CostComparison,
}

fn regime_row(name: &str, r: &RegimeCost) -> Vec<String> {
    vec![
        name.to_string(),
        r.interval.map(num).unwrap_or_else(|| "-".to_string()),
        num(r.mtbf),
        num(r.expected_failures),
        num(r.failure_cost),
        num(r.maintenance_count),
        num(r.maintenance_cost),
        num(r.total_cost),
    ]
}

impl Report for CostPayload {
    fn command(&self) -> &'static str {
        "cost"
    }

    fn markdown(&self) -> String {
        let c = &self.comparison;
        let mut out = format!(
            "{}, {} operating hours per year.\n\n",
            describe(&self.distribution),
            num(self.policy.operating_hours)
        );
        out.push_str(&table(
            &[
                "regime",
                "interval",
                "MTBF",
                "failures/yr",
                "failure cost",
                "maintenances/yr",
                "maintenance cost",
                "total",
            ],
            &[
                regime_row("no maintenance", &c.no_maintenance),
                regime_row("maintenance", &c.maintenance),
                regime_row("optimized", &c.optimized),
            ],
        ));
        if !c.optimization.converged {
            out.push_str(&format!(
                "\nOptimizer stopped after {} iterations without converging: {}\n",
                c.optimization.iterations, c.optimization.message
            ));
        }
        out
    }

    fn summary(&self) -> String {
        let c = &self.comparison;
        format!(
            "none {} / at {} h {} / optimized {} h {}{}",
            num(c.no_maintenance.total_cost),
            num(self.policy.maintenance_interval),
            num(c.maintenance.total_cost),
            num(c.optimization.interval),
            num(c.optimized.total_cost),
            if c.optimization.converged { "" } else { " (not converged)" }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulatePayload {
    pub distribution: LifetimeDistribution,
    pub cutoff: f64,
    pub components: usize,
    /// Per-component horizon in hours.
    pub horizon: f64,
    pub run: SimulationRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trials_path: Option<String>,
}

fn stats_row(name: &str, s: &Stats) -> Vec<String> {
    vec![
        name.to_string(),
        num(s.mean),
        num(s.std),
        num(s.p5),
        num(s.p50),
        num(s.p95),
    ]
}

impl Report for SimulatePayload {
    fn command(&self) -> &'static str {
        "simulate"
    }

    fn markdown(&self) -> String {
        let s = &self.run.summary;
        let mut out = format!(
            "{} policy, {}, interval {} h, {} components, {} repeats over {} years (seed {}).\n\nPer year:\n\n",
            self.run.policy,
            describe(&self.distribution),
            num(self.cutoff),
            self.components,
            s.repeats,
            s.years,
            self.run.seed
        );
        out.push_str(&table(
            &["quantity", "mean", "std", "p5", "p50", "p95"],
            &[
                stats_row("maintenances", &s.maintenance),
                stats_row("failures", &s.failures),
                stats_row("cost", &s.cost),
            ],
        ));
        if let Some(path) = &self.trials_path {
            out.push_str(&format!("\nTrial sequences written to `{}`.\n", path));
        }
        out
    }

    fn summary(&self) -> String {
        let s = &self.run.summary;
        format!(
            "{} x{}: {:.2} maintenances/yr, {:.2} failures/yr, cost {}/yr",
            self.run.policy,
            s.repeats,
            s.maintenance.mean,
            s.failures.mean,
            num(s.cost.mean)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratePayload {
    pub distribution: LifetimeDistribution,
    pub rows: usize,
    pub cutoff: f64,
    pub failures: usize,
    pub censored: usize,
    pub path: String,
}

impl Report for GeneratePayload {
    fn command(&self) -> &'static str {
        "generate"
    }

    fn markdown(&self) -> String {
        format!(
            "Wrote {} rows from {} censored at {} h to `{}`: {} failures, {} censored.\n",
            self.rows,
            describe(&self.distribution),
            num(self.cutoff),
            self.path,
            self.failures,
            self.censored
        )
    }

    fn summary(&self) -> String {
        format!("{} rows ({} failures) -> {}", self.rows, self.failures, self.path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SprtRunPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub plan: SprtPlan,
    pub dataset: String,
    pub components: usize,
    /// Calendar years of fleet testing up to the decision.
    pub test_years: f64,
    pub outcome: SprtOutcome,
}

impl Report for SprtRunPayload {
    fn command(&self) -> &'static str {
        "sprt run"
    }

    fn markdown(&self) -> String {
        let o = &self.outcome;
        let b = &o.boundaries;
        let mut out = format!(
            "Plan {}: alpha {}, beta {}, d {}, m0 {} h.\n\nBoundaries: accept at PR <= {}, reject at PR >= {}.\n\n",
            self.plan_id.as_deref().unwrap_or("(inline)"),
            self.plan.alpha,
            self.plan.beta,
            self.plan.discrimination_ratio,
            num(self.plan.specified_mtbf),
            num(b.lower),
            num(b.upper)
        );
        out.push_str(&format!("**Result: {}**", o.state));
        match o.decision_index {
            Some(i) => out.push_str(&format!(
                " at record {} after {} h and {} failures ({:.2} test years).\n\n",
                i,
                num(o.cumulative_duration),
                o.cumulative_failures,
                self.test_years
            )),
            None => out.push_str(&format!(
                " after all {} records ({} h, {} failures).\n\n",
                o.steps.len(),
                num(o.cumulative_duration),
                o.cumulative_failures
            )),
        }
        let rows: Vec<Vec<String>> = o
            .steps
            .iter()
            .map(|s| {
                vec![
                    s.index.to_string(),
                    num(s.cumulative_duration),
                    s.cumulative_failures.to_string(),
                    num(s.probability_ratio),
                    s.state.to_string(),
                ]
            })
            .collect();
        out.push_str(&table(&["record", "duration", "failures", "PR", "state"], &rows));
        out
    }

    fn summary(&self) -> String {
        let o = &self.outcome;
        match (o.state, o.decision_index) {
            (SprtState::Accepted | SprtState::Rejected, Some(i)) => format!(
                "{} at record {} ({} failures, {:.2} test years)",
                o.state, i, o.cumulative_failures, self.test_years
            ),
            _ => format!("{} after {} records", o.state, o.steps.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OcPayload {
    pub plan: SprtPlan,
    pub components: usize,
    pub boundaries: Boundaries,
    pub decision_lines: DecisionLines,
    pub minimum_test_time: f64,
    pub points: Vec<OcPoint>,
}

impl Report for OcPayload {
    fn command(&self) -> &'static str {
        "sprt oc"
    }

    fn markdown(&self) -> String {
        let l = &self.decision_lines;
        let mut out = format!(
            "Accept line: failures = {:.4} + {:.6e} T. Reject line: failures = {:.4} + {:.6e} T.\n\n",
            l.accept_intercept, l.slope, l.reject_intercept, l.slope
        );
        out.push_str(&format!(
            "Minimum test time to accept with {} components: {} h per component.\n\n",
            self.components,
            num(self.minimum_test_time)
        ));
        let rows: Vec<Vec<String>> = self
            .points
            .iter()
            .map(|p| {
                vec![
                    format!("{:.3}", p.h),
                    num(p.mtbf),
                    format!("{:.4}", p.pa),
                    num(p.expected_failures),
                    num(p.expected_time),
                ]
            })
            .collect();
        out.push_str(&table(&["h", "MTBF", "Pa", "E[r]", "E[T]"], &rows));
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} OC points, minimum test time {} h",
            self.points.len(),
            num(self.minimum_test_time)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanAddPayload {
    pub path: String,
    pub validation: PlanValidation,
    pub plan: TestPlan,
    /// Plans in the collection after the call.
    pub plans: usize,
}

impl Report for PlanAddPayload {
    fn command(&self) -> &'static str {
        "plan add"
    }

    fn markdown(&self) -> String {
        let verdict = match self.validation {
            PlanValidation::Pass => "added",
            PlanValidation::IdError => "rejected: id already in use",
            PlanValidation::ParamError => "rejected: parameters duplicate an existing plan",
        };
        format!(
            "Plan `{}` {} ({} plans in `{}`).\n",
            self.plan.id, verdict, self.plans, self.path
        )
    }

    fn summary(&self) -> String {
        format!("{} {}", self.plan.id, self.validation)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanListPayload {
    pub path: String,
    pub plans: Vec<TestPlan>,
}

impl Report for PlanListPayload {
    fn command(&self) -> &'static str {
        "plan list"
    }

    fn markdown(&self) -> String {
        if self.plans.is_empty() {
            return format!("No plans in `{}`.\n", self.path);
        }
        let rows: Vec<Vec<String>> = self
            .plans
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.alpha.to_string(),
                    p.beta.to_string(),
                    p.discrimination_ratio.to_string(),
                    num(p.specified_mtbf),
                ]
            })
            .collect();
        table(&["id", "alpha", "beta", "d", "m0"], &rows)
    }

    fn summary(&self) -> String {
        format!("{} plans in {}", self.plans.len(), self.path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub snapshot: ConfigSnapshot,
    pub config: EngineConfig,
}

impl Report for ConfigReport {
    fn command(&self) -> &'static str {
        "config show"
    }

    fn markdown(&self) -> String {
        let s = &self.snapshot;
        let json = serde_json::to_string_pretty(&self.config).unwrap_or_default();
        format!(
            "Source: {} ({})\n\nHash: `{}`\n\n```json\n{}\n```\n",
            s.source,
            s.config_path.as_deref().unwrap_or("no file"),
            s.config_hash,
            json
        )
    }

    fn summary(&self) -> String {
        format!("{} {}", self.snapshot.source, self.snapshot.short_id())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigIssue {
    pub code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl From<&ValidationError> for ConfigIssue {
    fn from(err: &ValidationError) -> Self {
        ConfigIssue {
            code: err.code(),
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValidationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub valid: bool,
    pub issues: Vec<ConfigIssue>,
}

impl ConfigValidationReport {
    pub fn new(path: Option<String>, issues: &[ValidationError]) -> Self {
        ConfigValidationReport {
            path,
            valid: issues.is_empty(),
            issues: issues.iter().map(ConfigIssue::from).collect(),
        }
    }
}

impl Report for ConfigValidationReport {
    fn command(&self) -> &'static str {
        "config validate"
    }

    fn markdown(&self) -> String {
        let target = self.path.as_deref().unwrap_or("built-in defaults");
        if self.valid {
            return format!("`{}` is valid.\n", target);
        }
        let mut out = format!("`{}` has {} issue(s):\n\n", target, self.issues.len());
        for issue in &self.issues {
            out.push_str(&format!("- {}\n", issue.message));
        }
        out
    }

    fn summary(&self) -> String {
        if self.valid {
            "valid".to_string()
        } else {
            format!("{} issue(s)", self.issues.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{compare, PolicyParameters, OPTIMIZER_MAX_ITERATIONS};
    use crate::sprt::evaluate;
    use mtbf_common::{FailureRecord, OutputFormat, PlanId, RunId};

    #[test]
    fn cost_markdown_lists_three_regimes() {
        let dist = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
        let policy = PolicyParameters::new(50_000.0, 20_000.0, 3_000.0, 9_000.0).unwrap();
        let comparison = compare(&dist, &policy, OPTIMIZER_MAX_ITERATIONS).unwrap();
        let payload = CostPayload {
            distribution: dist,
            policy,
            comparison,
        };
        let md = payload.markdown();
        assert!(md.contains("| no maintenance | - |"));
        assert!(md.contains("| maintenance | 9000 |"));
        assert!(md.contains("| optimized |"));
        assert!(payload.summary().starts_with("none 55387"));

        let json = super::super::render(&RunId::new(), &payload, OutputFormat::Json);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["data"]["distribution"]["family"], "weibull");
        assert!(v["data"]["comparison"]["optimization"]["converged"].as_bool().unwrap());
    }

    #[test]
    fn sprt_summary_reports_decision() {
        let plan = SprtPlan::new(0.05, 0.05, 1.5, 20_000.0).unwrap();
        let records: Vec<FailureRecord> =
            (0..40).map(|_| FailureRecord::failure(1_000.0)).collect();
        let outcome = evaluate(&plan, &records);
        let payload = SprtRunPayload {
            plan_id: None,
            plan,
            dataset: "inline".into(),
            components: 10,
            test_years: outcome.test_years(10, 5_000.0).unwrap(),
            outcome,
        };
        assert!(payload.summary().starts_with("rejected at record"));
        assert!(payload.markdown().contains("**Result: rejected**"));
    }

    #[test]
    fn plan_add_verdicts() {
        let plan = TestPlan::new(
            PlanId::parse("P1").unwrap(),
            SprtPlan::new(0.05, 0.05, 1.5, 20_000.0).unwrap(),
        );
        let payload = PlanAddPayload {
            path: "plans.json".into(),
            validation: PlanValidation::IdError,
            plan,
            plans: 1,
        };
        assert!(payload.markdown().contains("id already in use"));
        assert_eq!(payload.summary(), "P1 iderror");
    }

    #[test]
    fn config_validation_report_lists_fields() {
        let issues = vec![ValidationError::InvalidValue {
            field: "distribution.shape".into(),
            message: "Must be a positive finite number, got -1".into(),
        }];
        let report = ConfigValidationReport::new(Some("config.json".into()), &issues);
        assert!(!report.valid);
        assert_eq!(report.issues[0].field.as_deref(), Some("distribution.shape"));
        assert_eq!(report.summary(), "1 issue(s)");
        assert_eq!(
            ConfigValidationReport::new(None, &[]).markdown(),
            "`built-in defaults` is valid.\n"
        );
    }
}
