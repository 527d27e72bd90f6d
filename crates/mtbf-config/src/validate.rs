//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::engine::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 40,
            ValidationError::ParseError(_) => 41,
            ValidationError::InvalidValue { .. } => 42,
            ValidationError::VersionMismatch { .. } => 43,
        }
    }

    /// Dotted field path for `InvalidValue`, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<ValidationError> for mtbf_common::Error {
    fn from(err: ValidationError) -> Self {
        mtbf_common::Error::Config(err.to_string())
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn positive(issues: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        issues.push(invalid(field, format!("Must be a positive finite number, got {}", value)));
    }
}

fn non_negative(issues: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        issues.push(invalid(field, format!("Must be finite and >= 0, got {}", value)));
    }
}

fn open_unit(issues: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !(value > 0.0 && value < 1.0) {
        issues.push(invalid(field, format!("Must be in (0, 1), got {}", value)));
    }
}

fn at_least<T: PartialOrd + std::fmt::Display>(
    issues: &mut Vec<ValidationError>,
    field: &str,
    value: T,
    min: T,
) {
    if value < min {
        issues.push(invalid(field, format!("Must be >= {}, got {}", min, value)));
    }
}

/// Every problem found in the configuration, in file order.
pub fn collect_issues(config: &EngineConfig) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    let expected_major = crate::CONFIG_SCHEMA_VERSION.split('.').next();
    if config.schema_version.split('.').next() != expected_major {
        issues.push(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    positive(&mut issues, "distribution.shape", config.distribution.shape);
    positive(&mut issues, "distribution.scale", config.distribution.scale);

    at_least(&mut issues, "fleet.components", config.fleet.components, 1);
    positive(
        &mut issues,
        "fleet.operating_hours_per_component",
        config.fleet.operating_hours_per_component,
    );

    non_negative(&mut issues, "costs.failure_cost", config.costs.failure_cost);
    non_negative(&mut issues, "costs.maintenance_cost", config.costs.maintenance_cost);

    if let Some(interval) = config.maintenance.interval {
        positive(&mut issues, "maintenance.interval", interval);
    }

    at_least(&mut issues, "fitting.max_iterations", config.fitting.max_iterations, 1);
    at_least(&mut issues, "optimizer.max_iterations", config.optimizer.max_iterations, 1);

    at_least(&mut issues, "simulation.repeats", config.simulation.repeats, 1);
    positive(&mut issues, "simulation.trial_years", config.simulation.trial_years);

    let seq = &config.sequential;
    open_unit(&mut issues, "sequential.alpha", seq.alpha);
    open_unit(&mut issues, "sequential.beta", seq.beta);
    if !(seq.discrimination_ratio.is_finite() && seq.discrimination_ratio > 1.0) {
        issues.push(invalid(
            "sequential.discrimination_ratio",
            format!("Must be > 1, got {}", seq.discrimination_ratio),
        ));
    }
    positive(&mut issues, "sequential.specified_mtbf", seq.specified_mtbf);
    at_least(&mut issues, "sequential.components", seq.components, 1);
    at_least(&mut issues, "sequential.oc_points", seq.oc_points, 2);
    positive(&mut issues, "sequential.h_limit", seq.h_limit);

    issues
}

/// Validate the configuration semantically, returning the first problem.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    match collect_issues(config).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn reports_field_path() {
        let mut c = EngineConfig::default();
        c.distribution.shape = -1.0;
        let err = validate_config(&c).unwrap_err();
        assert_eq!(err.field(), Some("distribution.shape"));
        assert_eq!(err.code(), 42);
    }

    #[test]
    fn collects_every_issue() {
        let mut c = EngineConfig::default();
        c.sequential.alpha = 1.0;
        c.sequential.discrimination_ratio = 1.0;
        c.simulation.repeats = 0;
        c.maintenance.interval = Some(0.0);
        let fields: Vec<String> = collect_issues(&c)
            .iter()
            .filter_map(|e| e.field().map(str::to_string))
            .collect();
        assert_eq!(
            fields,
            vec![
                "maintenance.interval",
                "simulation.repeats",
                "sequential.alpha",
                "sequential.discrimination_ratio",
            ]
        );
    }

    #[test]
    fn nan_is_rejected() {
        let mut c = EngineConfig::default();
        c.costs.failure_cost = f64::NAN;
        c.sequential.beta = f64::NAN;
        assert_eq!(collect_issues(&c).len(), 2);
    }

    #[test]
    fn major_version_mismatch() {
        let mut c = EngineConfig::default();
        c.schema_version = "2.0.0".into();
        assert!(matches!(
            validate_config(&c),
            Err(ValidationError::VersionMismatch { .. })
        ));
        c.schema_version = "1.4.0".into();
        assert!(validate_config(&c).is_ok());
    }

    #[test]
    fn converts_into_engine_error() {
        let err: mtbf_common::Error = ValidationError::ParseError("bad".into()).into();
        assert_eq!(err.code(), 40);
    }
}
