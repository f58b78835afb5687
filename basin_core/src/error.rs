//! Error types for the basin simulation core.

use thiserror::Error;

/// Validation failures raised before any day is simulated.
///
/// Every variant is a deterministic input error - there is nothing to
/// retry. Mapping to a user-facing status is the caller's job.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Structural: the farm list is empty
    #[error("at least one farm is required")]
    NoFarms,

    /// Structural: two or more farms share an id
    #[error("farm ids must be unique; duplicate ids: {0}")]
    DuplicateFarmIds(String),

    /// Capacity invariant violated for the surface reservoir
    #[error("initial_reservoir cannot exceed reservoir_capacity")]
    ReservoirOverCapacity,

    /// Capacity invariant violated for the groundwater pool
    #[error("initial_groundwater cannot exceed groundwater_capacity")]
    GroundwaterOverCapacity,

    /// A policy name outside the closed policy set
    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    /// Quota policy invoked without a province-quota map
    #[error("province_quotas must be provided for the quota policy")]
    MissingQuotas,

    /// Quota policy invoked with at least one province-less farm
    #[error("all farms must include a province for the quota policy")]
    MissingProvince,

    /// Quota map whose values sum to zero or less
    #[error("province_quotas must contain positive values")]
    NonPositiveQuotas,

    /// Farm province outside the fixed pakistan-quota province set
    #[error(
        "pakistan-quota policy only supports Punjab, Sindh, Khyber Pakhtunkhwa, \
         and Balochistan; invalid province(s): {0}"
    )]
    InvalidProvince(String),

    /// Quota map key outside the fixed pakistan-quota province set
    #[error("province_quotas contains invalid province(s) for pakistan-quota policy: {0}")]
    InvalidQuotaProvince(String),

    /// External inflow series shorter than the simulation horizon
    #[error("external_inflow_series length must be at least equal to the number of days")]
    InflowSeriesTooShort,

    /// External inflow series with a negative entry
    #[error("external_inflow_series values must be non-negative")]
    NegativeInflow,

    /// A config field outside its allowed range
    #[error("{field} {requirement}")]
    ConfigRange {
        field: &'static str,
        requirement: &'static str,
    },

    /// Stress-test run count outside the allowed range
    #[error("runs must be between {min} and {max}")]
    RunsOutOfRange { min: u32, max: u32 },
}
