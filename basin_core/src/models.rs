//! Data model for the basin irrigation simulator.
//!
//! All types here are plain serde data. `SimulationConfig` is treated as
//! immutable for the duration of a run; derived variants are produced
//! with the `with_*` copy-with-override helpers so concurrent runs can
//! share a config by read-only reference.

use crate::error::SimulationError;
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A farm competing for irrigation water. Immutable for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    /// Unique farm id within a request
    pub id: String,

    /// Crop label, carried through to summaries
    pub crop_type: String,

    /// Base daily water demand (volume units)
    pub base_demand: f64,

    /// Coefficient of the logarithmic yield function
    #[serde(default = "default_yield_coefficient")]
    pub yield_coefficient: f64,

    /// Drought resilience in [0, 1]; scales the voluntary demand cut
    #[serde(default = "default_resilience")]
    pub resilience: f64,

    /// Province label, required by the quota policies
    #[serde(default)]
    pub province: Option<String>,
}

fn default_yield_coefficient() -> f64 {
    1.0
}

fn default_resilience() -> f64 {
    0.5
}

/// How province quotas are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaMode {
    /// Quotas are fractions of available water, normalized to sum to 1
    Share,

    /// Quotas are absolute caps, scaled down proportionally under scarcity
    Absolute,
}

impl Default for QuotaMode {
    fn default() -> Self {
        QuotaMode::Share
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Horizon length in days (1..=365)
    #[serde(default = "default_days")]
    pub days: u32,

    /// Surface reservoir capacity
    pub reservoir_capacity: f64,

    /// Reservoir level on day zero (must not exceed capacity)
    pub initial_reservoir: f64,

    /// Cap on the daily release from the reservoir
    pub max_daily_allocation: f64,

    /// Probability of rainfall on a given day
    #[serde(default = "default_rainfall_prob")]
    pub rainfall_prob: f64,

    /// Mean of the rainfall volume distribution
    #[serde(default = "default_rainfall_mean")]
    pub rainfall_mean: f64,

    /// Standard deviation of the rainfall volume distribution
    #[serde(default = "default_rainfall_std")]
    pub rainfall_std: f64,

    /// Probability of a drought day
    #[serde(default = "default_drought_prob")]
    pub drought_prob: f64,

    /// Multiplier applied to the allocation cap during drought; also
    /// scales the drought threshold in external-inflow mode
    #[serde(default = "default_drought_multiplier")]
    pub drought_multiplier: f64,

    /// Fraction by which demand is cut during drought, scaled per farm
    /// by its resilience
    #[serde(default = "default_drought_demand_reduction")]
    pub drought_demand_reduction: f64,

    /// Fraction of released water lost in conveyance (0..=0.95)
    #[serde(default)]
    pub conveyance_loss_rate: f64,

    /// Sustainability threshold as a fraction of reservoir capacity
    #[serde(default = "default_sustainability_threshold")]
    pub sustainability_threshold: f64,

    /// Depletion-risk penalty weight in the daily score
    #[serde(default = "default_weight")]
    pub alpha: f64,

    /// Inequality penalty weight in the daily score
    #[serde(default = "default_weight")]
    pub beta: f64,

    /// Blend weight of the fair policy: 0 = proportional, 1 = equal
    #[serde(default = "default_fairness_weight")]
    pub fairness_weight: f64,

    /// Province quota map for the quota policies
    #[serde(default)]
    pub province_quotas: Option<BTreeMap<String, f64>>,

    /// Interpretation of the quota values
    #[serde(default)]
    pub quota_mode: QuotaMode,

    /// Groundwater pool capacity
    #[serde(default)]
    pub groundwater_capacity: f64,

    /// Groundwater level on day zero (must not exceed capacity)
    #[serde(default)]
    pub initial_groundwater: f64,

    /// Cap on daily groundwater pumping; 0 disables groundwater
    #[serde(default)]
    pub max_groundwater_pumping: f64,

    /// Fixed daily groundwater recharge, applied before pumping
    #[serde(default)]
    pub groundwater_recharge: f64,

    /// Penalty weight on groundwater use in the daily score
    #[serde(default)]
    pub groundwater_penalty_weight: f64,

    /// Externally supplied inflow series; replaces the stochastic
    /// climate draw when present
    #[serde(default)]
    pub external_inflow_series: Option<Vec<f64>>,

    /// Random seed; stress tests derive per-run seeds from it
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_days() -> u32 {
    30
}

fn default_rainfall_prob() -> f64 {
    0.3
}

fn default_rainfall_mean() -> f64 {
    20.0
}

fn default_rainfall_std() -> f64 {
    5.0
}

fn default_drought_prob() -> f64 {
    0.1
}

fn default_drought_multiplier() -> f64 {
    0.5
}

fn default_drought_demand_reduction() -> f64 {
    0.25
}

fn default_sustainability_threshold() -> f64 {
    0.2
}

fn default_weight() -> f64 {
    1.0
}

fn default_fairness_weight() -> f64 {
    0.5
}

fn require_non_negative(value: f64, field: &'static str) -> Result<(), SimulationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::ConfigRange {
            field,
            requirement: "must be non-negative",
        })
    }
}

fn require_unit_interval(value: f64, field: &'static str) -> Result<(), SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::ConfigRange {
            field,
            requirement: "must be between 0 and 1",
        })
    }
}

impl SimulationConfig {
    /// Checks every field range and the capacity invariants.
    ///
    /// Called by both engine entry points before any day is simulated.
    /// NaN fails every range check, so it never reaches the day loop.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(1..=365).contains(&self.days) {
            return Err(SimulationError::ConfigRange {
                field: "days",
                requirement: "must be between 1 and 365",
            });
        }

        require_non_negative(self.reservoir_capacity, "reservoir_capacity")?;
        require_non_negative(self.initial_reservoir, "initial_reservoir")?;
        require_non_negative(self.max_daily_allocation, "max_daily_allocation")?;
        require_unit_interval(self.rainfall_prob, "rainfall_prob")?;
        require_non_negative(self.rainfall_mean, "rainfall_mean")?;
        require_non_negative(self.rainfall_std, "rainfall_std")?;
        require_unit_interval(self.drought_prob, "drought_prob")?;
        require_unit_interval(self.drought_multiplier, "drought_multiplier")?;
        require_unit_interval(self.drought_demand_reduction, "drought_demand_reduction")?;
        require_unit_interval(self.sustainability_threshold, "sustainability_threshold")?;
        require_non_negative(self.alpha, "alpha")?;
        require_non_negative(self.beta, "beta")?;
        require_unit_interval(self.fairness_weight, "fairness_weight")?;
        require_non_negative(self.groundwater_capacity, "groundwater_capacity")?;
        require_non_negative(self.initial_groundwater, "initial_groundwater")?;
        require_non_negative(self.max_groundwater_pumping, "max_groundwater_pumping")?;
        require_non_negative(self.groundwater_recharge, "groundwater_recharge")?;
        require_non_negative(self.groundwater_penalty_weight, "groundwater_penalty_weight")?;

        if !(0.0..=0.95).contains(&self.conveyance_loss_rate) {
            return Err(SimulationError::ConfigRange {
                field: "conveyance_loss_rate",
                requirement: "must be between 0 and 0.95",
            });
        }

        if self.initial_reservoir > self.reservoir_capacity {
            return Err(SimulationError::ReservoirOverCapacity);
        }
        if self.initial_groundwater > self.groundwater_capacity {
            return Err(SimulationError::GroundwaterOverCapacity);
        }

        Ok(())
    }

    /// Returns a copy with the given seed set.
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut config = self.clone();
        config.seed = Some(seed);
        config
    }

    /// Returns a copy with the given quota map and mode.
    pub fn with_quotas(&self, quotas: BTreeMap<String, f64>, mode: QuotaMode) -> Self {
        let mut config = self.clone();
        config.province_quotas = Some(quotas);
        config.quota_mode = mode;
        config
    }

    /// Absolute sustainability threshold in volume units.
    pub fn sustainability_threshold_volume(&self) -> f64 {
        self.sustainability_threshold * self.reservoir_capacity
    }
}

/// A full simulation request: farms, config, policy, comparison flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub farms: Vec<Farm>,
    pub config: SimulationConfig,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default = "default_true")]
    pub compare_policies: bool,
}

/// A stress-test request: like a simulation request, plus a run count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestRequest {
    pub farms: Vec<Farm>,
    pub config: SimulationConfig,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default = "default_runs")]
    pub runs: u32,
}

fn default_true() -> bool {
    true
}

fn default_runs() -> u32 {
    50
}

/// One simulated day's record. Produced exactly once per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMetrics {
    /// 1-based day index
    pub day: u32,
    pub rainfall: f64,
    pub drought: bool,
    pub reservoir_start: f64,
    pub reservoir_end: f64,
    pub groundwater_end: f64,
    pub total_allocated: f64,
    pub total_yield: f64,
    pub conveyance_loss: f64,
    pub groundwater_used: f64,
    /// Gini coefficient of the day's final allocations
    pub gini: f64,
    /// Normalized shortfall below the sustainability threshold
    pub depletion_risk: f64,
    /// Composite daily score (yield minus weighted penalties)
    pub score: f64,
}

/// Horizon-level aggregates for one policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub policy: Policy,
    pub total_yield: f64,
    pub avg_gini: f64,
    pub avg_depletion_risk: f64,
    pub final_reservoir: f64,
    pub final_groundwater: f64,
    /// `max(0, 1 - avg_depletion_risk)`
    pub sustainability_score: f64,
    pub total_conveyance_loss: f64,
    pub total_groundwater_used: f64,
}

/// Horizon-level aggregates for one farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmSummary {
    pub id: String,
    pub crop_type: String,
    pub total_allocated: f64,
    pub total_yield: f64,
    pub average_allocation: f64,
    pub average_yield: f64,
    pub unmet_demand_total: f64,
}

/// Everything one policy run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub summary: SimulationSummary,
    /// Ordered daily series, one entry per simulated day
    pub daily: Vec<DayMetrics>,
    pub farms: Vec<FarmSummary>,
}

/// The primary result plus comparison runs on the identical climate series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub primary: SimulationResult,
    #[serde(default)]
    pub comparisons: Vec<SimulationResult>,
}

/// Distribution of one scalar across stress-test runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressMetric {
    pub mean: f64,
    pub p10: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregated outcome of a stress test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestSummary {
    pub runs: u32,
    /// Per-run seeds, for audit and single-run reproduction
    pub seeds: Vec<u64>,
    pub total_yield: StressMetric,
    pub avg_gini: StressMetric,
    pub avg_depletion_risk: StressMetric,
    pub final_reservoir: StressMetric,
    pub final_groundwater: StressMetric,
    pub total_groundwater_used: StressMetric,
    /// Fraction of runs whose final reservoir fell below the
    /// sustainability threshold
    pub prob_below_threshold: f64,
}
