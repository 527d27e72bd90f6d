//! Engine configuration types (`config.json`).
//!
//! Every section has defaults, so a file only needs the values it changes:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "distribution": { "family": "weibull", "shape": 2.1, "scale": 18000 },
//!   "maintenance": { "interval": 9000 },
//!   "simulation": { "policy": "fleetwide", "repeats": 500, "seed": 7 }
//! }
//! ```

use mtbf_common::{DistributionFamily, MaintenancePolicy};
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Lifetime model used when no dataset is fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSection {
    pub family: DistributionFamily,
    pub shape: f64,
    /// Scale in hours.
    pub scale: f64,
}

impl Default for DistributionSection {
    fn default() -> Self {
        Self {
            family: DistributionFamily::Weibull,
            shape: 1.5,
            scale: 20_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSection {
    pub components: u32,
    /// Yearly operating hours of one component.
    pub operating_hours_per_component: f64,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            components: 10,
            operating_hours_per_component: 5_000.0,
        }
    }
}

impl FleetSection {
    /// Yearly operating hours of the whole fleet.
    pub fn fleet_operating_hours(&self) -> f64 {
        self.operating_hours_per_component * f64::from(self.components)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSection {
    pub failure_cost: f64,
    pub maintenance_cost: f64,
}

impl Default for CostSection {
    fn default() -> Self {
        Self {
            failure_cost: 20_000.0,
            maintenance_cost: 3_000.0,
        }
    }
}

/// Preventive maintenance interval; derived from the distribution when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FittingSection {
    /// Iteration cap applied to every optimizer attempt.
    pub max_iterations: usize,
    /// Retry with Nelder–Mead when BFGS does not converge.
    pub fallback: bool,
}

impl Default for FittingSection {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSection {
    pub max_iterations: usize,
}

impl Default for OptimizerSection {
    fn default() -> Self {
        Self { max_iterations: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub policy: MaintenancePolicy,
    pub repeats: usize,
    pub trial_years: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            policy: MaintenancePolicy::ComponentWise,
            repeats: 2_500,
            trial_years: 3.0,
            seed: None,
        }
    }
}

/// Sequential test plan parameters and operating-characteristic grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequentialSection {
    pub alpha: f64,
    pub beta: f64,
    pub discrimination_ratio: f64,
    pub specified_mtbf: f64,
    pub components: u32,
    pub oc_points: usize,
    pub h_limit: f64,
}

impl Default for SequentialSection {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.05,
            discrimination_ratio: 1.5,
            specified_mtbf: 20_000.0,
            components: 10,
            oc_points: 50,
            h_limit: 2.0,
        }
    }
}

/// Root of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub schema_version: String,
    #[serde(default)]
    pub distribution: DistributionSection,
    #[serde(default)]
    pub fleet: FleetSection,
    #[serde(default)]
    pub costs: CostSection,
    #[serde(default)]
    pub maintenance: MaintenanceSection,
    #[serde(default)]
    pub fitting: FittingSection,
    #[serde(default)]
    pub optimizer: OptimizerSection,
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub sequential: SequentialSection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            distribution: DistributionSection::default(),
            fleet: FleetSection::default(),
            costs: CostSection::default(),
            maintenance: MaintenanceSection::default(),
            fitting: FittingSection::default(),
            optimizer: OptimizerSection::default(),
            simulation: SimulationSection::default(),
            sequential: SequentialSection::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Pretty JSON rendering, as written by `mtbf config show`.
    pub fn to_json_pretty(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("Serialization failed: {}", e)))
    }
}
