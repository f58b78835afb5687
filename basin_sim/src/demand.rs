//! Per-farm daily demand under drought.

use basin_core::{Farm, SimulationConfig};

/// Effective daily demand for one farm.
///
/// Under drought, demand is cut by
/// `clamp(drought_demand_reduction * resilience, 0, 1)`: more resilient
/// farms absorb a larger voluntary cut. Never negative.
pub fn effective_demand(farm: &Farm, drought: bool, config: &SimulationConfig) -> f64 {
    if !drought || config.drought_demand_reduction <= 0.0 {
        return farm.base_demand;
    }
    let reduction = (config.drought_demand_reduction * farm.resilience).clamp(0.0, 1.0);
    (farm.base_demand * (1.0 - reduction)).max(0.0)
}
