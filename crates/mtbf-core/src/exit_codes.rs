//! Exit codes for the `mtbf` CLI.
//!
//! Exit code ranges:
//! - 0-4: outcomes (the command ran; the code says what it concluded)
//! - 10-19: user/input errors (fixable by changing arguments, data or config)
//! - 20-29: internal errors

use mtbf_common::Error;

/// Exit codes for `mtbf` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // Outcomes (0-4)
    /// Command completed; sequential test accepted if one ran.
    Clean = 0,

    /// Sequential test rejected the specified MTBF.
    Rejected = 1,

    /// Sequential test ran out of records before deciding.
    Indeterminate = 2,

    /// Interval optimizer stopped before converging; best iterate reported.
    NotConverged = 3,

    /// Plan was not added: id taken or parameters duplicate another plan.
    PlanConflict = 4,

    // User / input errors (10-19)
    /// Invalid command-line arguments.
    ArgsError = 10,

    /// Malformed dataset, plan file or out-of-domain parameter.
    InputError = 11,

    /// Configuration file missing, unparsable or invalid.
    ConfigError = 12,

    /// Model could not be evaluated for these inputs (fit failure, degenerate interval).
    ModelError = 13,

    // Internal errors (20-29)
    /// Internal error (bug).
    InternalError = 20,

    /// I/O error.
    IoError = 21,

    /// Quadrature failed to reach tolerance.
    NumericalError = 22,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-4.
    pub fn is_outcome(self) -> bool {
        (self as i32) < 10
    }

    /// Codes 10-19.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Codes 20-29.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Name used in JSON payloads.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::Rejected => "OK_REJECTED",
            ExitCode::Indeterminate => "OK_INDETERMINATE",
            ExitCode::NotConverged => "OK_NOT_CONVERGED",
            ExitCode::PlanConflict => "OK_PLAN_CONFLICT",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::NumericalError => "ERR_NUMERICAL",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidParameter(_) | Error::Dataset { .. } | Error::Json(_) => {
                ExitCode::InputError
            }
            Error::DegenerateInterval { .. } | Error::FitDidNotConverge { .. } => {
                ExitCode::ModelError
            }
            Error::Config(_) => ExitCode::ConfigError,
            Error::Integration(_) => ExitCode::NumericalError,
            Error::Io(_) => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
