//! MTBF engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `config.json`
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation with field-qualified errors
//! - Config snapshots for run provenance

pub mod engine;
pub mod resolve;
pub mod snapshot;
pub mod validate;

use std::path::Path;

pub use engine::{
    CostSection, DistributionSection, EngineConfig, FittingSection, FleetSection,
    MaintenanceSection, OptimizerSection, SequentialSection, SimulationSection,
};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{collect_issues, validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// A resolved, parsed and validated configuration with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, parse and validate the engine configuration.
///
/// Falls back to [`EngineConfig::default`] when no file is found.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let paths = resolve_config(cli_path);
    let Some(path) = paths.config.as_deref() else {
        let config = EngineConfig::default();
        let snapshot = ConfigSnapshot::defaults_only(&config);
        return Ok(LoadedConfig { config, snapshot });
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = EngineConfig::parse_json(&content)?;
    validate_config(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &paths, &content);
    Ok(LoadedConfig { config, snapshot })
}
