//! MTBF engine common types, identifiers, and errors.
//!
//! This crate provides foundational types shared across the engine crates:
//! - Failure/censoring records and the CSV dataset codec
//! - Plan and run identifiers
//! - The unified error type with stable codes
//! - Output format selection

pub mod error;
pub mod id;
pub mod kinds;
pub mod output;
pub mod record;

pub use error::{Error, ErrorCategory, ErrorReport, FitAttempt, Result};
pub use id::{PlanId, RunId};
pub use kinds::{DistributionFamily, MaintenancePolicy};
pub use output::OutputFormat;
pub use record::{parse_dataset, write_dataset, Dataset, FailureRecord, RecordStatus};

/// Schema version stamped on JSON payloads produced by the engine.
pub const SCHEMA_VERSION: &str = "1.0.0";
