//! Small enums shared between configuration and the engine.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifetime distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionFamily {
    #[default]
    Weibull,
    Gamma,
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionFamily::Weibull => write!(f, "weibull"),
            DistributionFamily::Gamma => write!(f, "gamma"),
        }
    }
}

/// Preventive maintenance policy simulated over a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePolicy {
    /// Each component is replaced when its own age reaches the interval.
    #[default]
    ComponentWise,
    /// The whole fleet is maintained on one shared calendar.
    Fleetwide,
}

impl fmt::Display for MaintenancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenancePolicy::ComponentWise => write!(f, "component_wise"),
            MaintenancePolicy::Fleetwide => write!(f, "fleetwide"),
        }
    }
}
