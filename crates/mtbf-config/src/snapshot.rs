//! Configuration snapshots for run provenance.
//!
//! A snapshot captures which configuration a run used, so results can be
//! traced back to the exact file content.

use chrono::{DateTime, Utc};
use mtbf_common::{DistributionFamily, MaintenancePolicy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::EngineConfig;
use crate::resolve::{ConfigPaths, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the file content, or of the serialized defaults.
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub family: DistributionFamily,
    pub shape: f64,
    pub scale: f64,
    pub components: u32,
    #[serde(default)]
    pub maintenance_interval: Option<f64>,
    pub policy: MaintenancePolicy,
    pub repeats: usize,
    pub sprt_alpha: f64,
    pub sprt_beta: f64,
    pub discrimination_ratio: f64,
    pub specified_mtbf: f64,
}

impl From<&EngineConfig> for ConfigSummary {
    fn from(c: &EngineConfig) -> Self {
        ConfigSummary {
            family: c.distribution.family,
            shape: c.distribution.shape,
            scale: c.distribution.scale,
            components: c.fleet.components,
            maintenance_interval: c.maintenance.interval,
            policy: c.simulation.policy,
            repeats: c.simulation.repeats,
            sprt_alpha: c.sequential.alpha,
            sprt_beta: c.sequential.beta,
            discrimination_ratio: c.sequential.discrimination_ratio,
            specified_mtbf: c.sequential.specified_mtbf,
        }
    }
}

impl ConfigSnapshot {
    /// Snapshot a configuration loaded from a file.
    pub fn new(config: &EngineConfig, paths: &ConfigPaths, content: &str) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: paths.config.as_ref().map(|p| p.display().to_string()),
            source: paths.source.to_string(),
            config_hash: hash_content(content),
            summary: ConfigSummary::from(config),
        }
    }

    /// Snapshot for built-in defaults (no config file loaded).
    pub fn defaults_only(config: &EngineConfig) -> Self {
        let rendered = serde_json::to_string(config).unwrap_or_default();
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: None,
            source: ConfigSource::BuiltinDefault.to_string(),
            config_hash: hash_content(&rendered),
            summary: ConfigSummary::from(config),
        }
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
