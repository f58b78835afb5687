//! Basin Core - data model and scoring math for the irrigation simulator.
//!
//! This crate holds everything the engine shares with its callers:
//! - **Models**: farms, simulation config, per-day metrics, summaries
//! - **Policies**: the closed set of allocation policies
//! - **Metrics**: Gini coefficient, depletion risk, yield, quantiles
//! - **Errors**: the validation-failure taxonomy
//!
//! Everything here is plain data and pure arithmetic; the day loop and
//! all randomness live in `basin_sim`.

pub mod error;
pub mod metrics;
pub mod models;
pub mod policy;

pub use error::SimulationError;
pub use models::{
    DayMetrics, Farm, FarmSummary, QuotaMode, SimulationConfig, SimulationRequest,
    SimulationResponse, SimulationResult, SimulationSummary, StressMetric, StressTestRequest,
    StressTestSummary,
};
pub use policy::{BaseRule, Policy};
