//! Payload rendering for the `mtbf` CLI.
//!
//! Every command produces a [`Report`] value. It is wrapped in an
//! [`Envelope`] carrying the schema version and run id, then rendered as
//! pretty JSON, a Markdown document or a single summary line.

pub mod report;

pub use report::{
    ConfigReport, ConfigValidationReport, CostPayload, FitPayload, GeneratePayload, OcPayload,
    PlanAddPayload, PlanListPayload, SimulatePayload, SprtRunPayload,
};

use chrono::{DateTime, Utc};
use mtbf_common::{Error, ErrorReport, OutputFormat, RunId, SCHEMA_VERSION};
use serde::Serialize;

/// A command payload that can be rendered in every output format.
pub trait Report: Serialize {
    /// Command name recorded in the envelope, e.g. `sprt run`.
    fn command(&self) -> &'static str;

    /// Markdown body, without the envelope header.
    fn markdown(&self) -> String;

    /// One line for quick status checks.
    fn summary(&self) -> String;
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub run_id: &'a RunId,
    pub generated_at: DateTime<Utc>,
    pub command: &'static str,
    pub status: &'static str,
    pub data: &'a T,
}

impl<'a, T: Report> Envelope<'a, T> {
    pub fn new(run_id: &'a RunId, data: &'a T) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            run_id,
            generated_at: Utc::now(),
            command: data.command(),
            status: "ok",
            data,
        }
    }
}

/// Render a payload in the requested format.
pub fn render<T: Report>(run_id: &RunId, data: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let envelope = Envelope::new(run_id, data);
            serde_json::to_string_pretty(&envelope).unwrap_or_else(|e| {
                format!(
                    r#"{{"schema_version":"{}","status":"error","error":"serialization failed: {}"}}"#,
                    SCHEMA_VERSION, e
                )
            })
        }
        OutputFormat::Md => {
            format!(
                "# mtbf {}\n\n{}\nRun: `{}`\n",
                data.command(),
                data.markdown(),
                run_id
            )
        }
        OutputFormat::Summary => format!("[{}] {}: {}", run_id, data.command(), data.summary()),
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    schema_version: &'static str,
    run_id: &'a RunId,
    generated_at: DateTime<Utc>,
    command: &'a str,
    status: &'static str,
    error: ErrorReport,
}

/// Render an engine error. Intended for stderr.
pub fn render_error(run_id: &RunId, command: &str, err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let envelope = ErrorEnvelope {
                schema_version: SCHEMA_VERSION,
                run_id,
                generated_at: Utc::now(),
                command,
                status: "error",
                error: ErrorReport::from(err),
            };
            serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| ErrorReport::from(err).to_json())
        }
        OutputFormat::Md => format!(
            "# mtbf {}: {}\n\n{}\n\nFix: {}\n",
            command,
            err.headline(),
            err,
            err.remediation()
        ),
        OutputFormat::Summary => format!("[{}] {} error: {}", run_id, command, err),
    }
}

/// Markdown table with right-aligned numeric columns.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&headers.join(" | "));
    out.push_str(" |\n|");
    for _ in headers {
        out.push_str("---:|");
    }
    out.push('\n');
    for row in rows {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");
    }
    out
}

/// Fixed-precision number for tables; large magnitudes lose their decimals.
pub(crate) fn num(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    if x.abs() >= 1_000.0 {
        format!("{:.0}", x)
    } else if x.abs() >= 1.0 {
        format!("{:.2}", x)
    } else {
        format!("{:.4}", x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Dummy {
        value: f64,
    }

    impl Report for Dummy {
        fn command(&self) -> &'static str {
            "dummy"
        }
        fn markdown(&self) -> String {
            table(&["value"], &[vec![num(self.value)]])
        }
        fn summary(&self) -> String {
            format!("value {}", num(self.value))
        }
    }

    #[test]
    fn test_json_envelope() {
        let run_id = RunId::new();
        let out = render(&run_id, &Dummy { value: 1.5 }, OutputFormat::Json);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
        assert_eq!(v["command"], "dummy");
        assert_eq!(v["status"], "ok");
        assert_eq!(v["run_id"], run_id.0.as_str());
        assert_eq!(v["data"]["value"], 1.5);
    }

    #[test]
    fn test_markdown_and_summary() {
        let run_id = RunId::new();
        let md = render(&run_id, &Dummy { value: 12_345.678 }, OutputFormat::Md);
        assert!(md.starts_with("# mtbf dummy"));
        assert!(md.contains("| value |"));
        assert!(md.contains("| 12346 |"));
        let summary = render(&run_id, &Dummy { value: 0.05 }, OutputFormat::Summary);
        assert!(summary.ends_with("dummy: value 0.0500"));
    }

    #[test]
    fn test_error_envelope() {
        let run_id = RunId::new();
        let err = Error::DegenerateInterval { cutoff: 1.0 };
        let out = render_error(&run_id, "cost", &err, OutputFormat::Json);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"]["code"], 21);
        assert_eq!(v["error"]["category"], "numerical");
        assert_eq!(v["error"]["context"]["cutoff"], 1.0);

        let md = render_error(&run_id, "cost", &err, OutputFormat::Md);
        assert!(md.contains("Degenerate Interval"));
    }

    #[test]
    fn test_num_precision() {
        assert_eq!(num(48_198.03), "48198");
        assert_eq!(num(5.310855), "5.31");
        assert_eq!(num(0.052631), "0.0526");
        assert_eq!(num(f64::INFINITY), "inf");
    }
}
