//! Groundwater pool: daily recharge plus shortfall-driven pumping.

use basin_core::SimulationConfig;

/// The groundwater reserve backing unmet surface demand.
///
/// Level stays in `[0, capacity]` through every operation. Recharge is
/// applied once per day before pumping.
#[derive(Debug, Clone)]
pub struct GroundwaterPool {
    level: f64,
    capacity: f64,
    max_pumping: f64,
    recharge_rate: f64,
}

impl GroundwaterPool {
    /// Initializes the pool from the run config.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            level: config.initial_groundwater.min(config.groundwater_capacity),
            capacity: config.groundwater_capacity,
            max_pumping: config.max_groundwater_pumping,
            recharge_rate: config.groundwater_recharge,
        }
    }

    /// Current level.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Applies the daily recharge, capped at capacity.
    pub fn recharge(&mut self) {
        self.level = (self.level + self.recharge_rate).min(self.capacity);
    }

    /// Pumps up to `min(max_pumping, level, total unmet)` and splits it
    /// across farms in proportion to their unmet demand.
    ///
    /// Returns the pumped total and the per-farm split. Disabled pumping
    /// (`max_pumping == 0`), an empty pool, or no unmet demand all yield
    /// a zero pump.
    pub fn pump(&mut self, unmet: &[f64]) -> (f64, Vec<f64>) {
        let total_unmet: f64 = unmet.iter().sum();
        if self.max_pumping <= 0.0 || self.level <= 0.0 || total_unmet <= 0.0 {
            return (0.0, vec![0.0; unmet.len()]);
        }

        let pumped = self.max_pumping.min(self.level).min(total_unmet);
        let split = unmet
            .iter()
            .map(|&gap| pumped * gap / total_unmet)
            .collect();

        self.level = (self.level - pumped).max(0.0);
        (pumped, split)
    }
}
