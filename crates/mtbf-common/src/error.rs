//! Error types for the MTBF engine.
//!
//! Every variant carries a stable numeric code, a category, a
//! recoverability hint and a remediation line. The CLI renders it as JSON
//! or Markdown on stderr.
//!
//! # JSON Output
//!
//! ```json
//! {
//!   "code": 30,
//!   "category": "fit",
//!   "message": "fit did not converge: ...",
//!   "recoverable": true,
//!   "context": { "attempts": [{ "method": "bfgs", "iterations": 100 }] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse grouping of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or out-of-domain input.
    Input,
    /// Quadrature or degenerate-interval failures.
    Numerical,
    /// Likelihood fitting failures.
    Fit,
    /// Configuration file errors.
    Config,
    /// Filesystem and JSON failures.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Fit => write!(f, "fit"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// One optimizer attempt made by the fitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitAttempt {
    pub method: String,
    pub iterations: usize,
}

impl fmt::Display for FitAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} iterations", self.method, self.iterations)
    }
}

fn join_attempts(attempts: &[FitAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dataset line {line}: {message}")]
    Dataset { line: usize, message: String },

    // Numerical errors (20-29)
    #[error("integration failed: {0}")]
    Integration(String),

    #[error("degenerate maintenance interval {cutoff}: no failure probability mass below the cutoff")]
    DegenerateInterval { cutoff: f64 },

    // Fit errors (30-39)
    #[error("fit did not converge: {}", join_attempts(.attempts))]
    FitDidNotConverge { attempts: Vec<FitAttempt> },

    // Config errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (50-59)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code, grouped by category:
    /// - 10-19: input
    /// - 20-29: numerical
    /// - 30-39: fit
    /// - 40-49: config
    /// - 50-59: I/O
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidParameter(_) => 10,
            Error::Dataset { .. } => 11,
            Error::Integration(_) => 20,
            Error::DegenerateInterval { .. } => 21,
            Error::FitDidNotConverge { .. } => 30,
            Error::Config(_) => 40,
            Error::Io(_) => 50,
            Error::Json(_) => 51,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidParameter(_) | Error::Dataset { .. } => ErrorCategory::Input,
            Error::Integration(_) | Error::DegenerateInterval { .. } => ErrorCategory::Numerical,
            Error::FitDidNotConverge { .. } => ErrorCategory::Fit,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether a caller can plausibly succeed by changing its input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidParameter(_) => true,
            Error::Dataset { .. } => true,
            Error::Integration(_) => false,
            Error::DegenerateInterval { .. } => true,
            Error::FitDidNotConverge { .. } => true,
            Error::Config(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidParameter(_) => {
                "Shape, scale, costs and intervals must be positive finite numbers."
            }
            Error::Dataset { .. } => {
                "The dataset needs 'duration' and 'status' columns with non-negative durations and status 0 or 1."
            }
            Error::Integration(_) => {
                "The integrand could not be resolved to tolerance. Try a smaller maintenance interval or different parameters."
            }
            Error::DegenerateInterval { .. } => {
                "The maintenance interval is too short for any failure to occur. Increase the interval."
            }
            Error::FitDidNotConverge { .. } => {
                "Check the dataset for degenerate durations, or supply a closer initial guess."
            }
            Error::Config(_) => "Run 'mtbf config validate' to locate the offending field.",
            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidParameter(_) => "Invalid Parameter",
            Error::Dataset { .. } => "Invalid Dataset",
            Error::Integration(_) => "Integration Failed",
            Error::DegenerateInterval { .. } => "Degenerate Interval",
            Error::FitDidNotConverge { .. } => "Fit Did Not Converge",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Serializable form of an [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();
        match err {
            Error::Dataset { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::DegenerateInterval { cutoff } => {
                context.insert("cutoff".to_string(), serde_json::json!(cutoff));
            }
            Error::FitDidNotConverge { attempts } => {
                context.insert("attempts".to_string(), serde_json::json!(attempts));
            }
            _ => {}
        }

        ErrorReport {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
