//! Structured test logging utilities.
//!
//! Appends JSONL entries to `target/test-logs` so long-running statistical
//! tests leave a machine-readable trace of the numbers they compared.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_DIR_NAME: &str = "test-logs";

#[derive(Debug, Serialize)]
struct TestRecord<'a> {
    ts: String,
    level: &'a str,
    msg: &'a str,
    file: &'a str,
    line: u32,
    test: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn log_file_path() -> PathBuf {
    let target = std::env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target
        .join(LOG_DIR_NAME)
        .join(format!("mtbf-core-tests-{}.jsonl", std::process::id()))
}

fn append_line(line: &str) {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("test_log: cannot create {}: {}", parent.display(), err);
            return;
        }
    }
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| writeln!(f, "{}", line));
    if let Err(err) = result {
        eprintln!("test_log: cannot write {}: {}", path.display(), err);
    }
}

/// Emit a structured JSONL log entry for tests.
///
/// The `test` key defaults to the current thread name, which the test
/// harness sets to the test path.
pub fn log_event(level: &str, msg: &str, file: &str, line: u32, fields: &[(&str, Value)]) {
    let mut extra = Map::new();
    let mut test = None;
    for (key, value) in fields {
        if *key == "test" {
            test = value.as_str().map(str::to_string);
        } else {
            extra.insert((*key).to_string(), value.clone());
        }
    }
    let test = test.unwrap_or_else(|| {
        std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string()
    });

    let record = TestRecord {
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        level,
        msg,
        file,
        line,
        test,
        fields: extra,
    };
    match serde_json::to_string(&record) {
        Ok(line) => append_line(&line),
        Err(err) => eprintln!("test_log: cannot serialize entry: {}", err),
    }
}

/// Relative difference used by [`assert_close!`](crate::assert_close).
pub fn relative_difference(expected: f64, actual: f64) -> f64 {
    if expected == actual {
        return 0.0;
    }
    (actual - expected).abs() / expected.abs().max(f64::MIN_POSITIVE)
}

#[macro_export]
macro_rules! test_log {
    ($level:ident, $msg:expr $(, $key:ident = $val:expr )* $(,)?) => {{
        let fields = vec![
            $(
                (stringify!($key), serde_json::json!($val)),
            )*
        ];
        let msg_string = $msg.to_string();
        $crate::test_log::log_event(stringify!($level), &msg_string, file!(), line!(), &fields);
    }};
}

/// Assert two floats agree to a relative tolerance, logging the comparison.
#[macro_export]
macro_rules! assert_close {
    ($expected:expr, $actual:expr, $rel:expr, $msg:expr) => {{
        let expected: f64 = $expected;
        let actual: f64 = $actual;
        let rel: f64 = $rel;
        let diff = $crate::test_log::relative_difference(expected, actual);
        let level = if diff <= rel { "INFO" } else { "ERROR" };
        $crate::test_log::log_event(
            level,
            $msg,
            file!(),
            line!(),
            &[
                ("expected", serde_json::json!(expected)),
                ("actual", serde_json::json!(actual)),
                ("relative_difference", serde_json::json!(diff)),
                ("tolerance", serde_json::json!(rel)),
            ],
        );
        if !(diff <= rel) {
            panic!(
                "{}: expected {} got {} (relative difference {:.3e} > {:.1e})",
                $msg, expected, actual, diff, rel
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serializes() {
        log_event(
            "INFO",
            "test-log",
            "test_log.rs",
            7,
            &[
                ("test", Value::String("test_log_event_serializes".into())),
                ("mtbf", serde_json::json!(18_054.9)),
            ],
        );

        let content = fs::read_to_string(log_file_path()).expect("log file should be readable");
        let entry = content
            .lines()
            .filter_map(|l| serde_json::from_str::<Value>(l).ok())
            .find(|v| v["msg"] == "test-log" && v["test"] == "test_log_event_serializes")
            .expect("structured entry present");
        assert_eq!(entry["level"], "INFO");
        assert_eq!(entry["mtbf"], 18_054.9);
    }

    #[test]
    fn test_relative_difference() {
        assert_eq!(relative_difference(2.0, 2.0), 0.0);
        assert!((relative_difference(100.0, 101.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_assert_close_accepts_within_tolerance() {
        crate::assert_close!(20_000.0, 20_001.0, 1e-4, "within tolerance");
    }

    #[test]
    #[should_panic(expected = "relative difference")]
    fn test_assert_close_panics_outside_tolerance() {
        crate::assert_close!(1.0, 1.1, 1e-3, "outside tolerance");
    }
}
