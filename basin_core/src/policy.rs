//! Allocation policy identifiers.
//!
//! Policies form a closed set so the engine's dispatch is exhaustive at
//! compile time; the only "unknown policy" surface left is string
//! parsing at the boundary.

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};

/// Water-distribution policy for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Available water split evenly across farms
    Equal,

    /// Split in proportion to each farm's share of total demand
    Proportional,

    /// Convex blend of proportional and equal
    Fair,

    /// Province-quota partitioning, then fair allocation per province
    Quota,

    /// Quota specialization fixed to the four Pakistani provinces,
    /// deriving equal share quotas when none are supplied
    PakistanQuota,
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Fair
    }
}

impl Policy {
    /// Returns the wire name of the policy.
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Equal => "equal",
            Policy::Proportional => "proportional",
            Policy::Fair => "fair",
            Policy::Quota => "quota",
            Policy::PakistanQuota => "pakistan-quota",
        }
    }

    /// Returns the standard policies used for comparison runs.
    pub fn comparison_set() -> [Policy; 3] {
        [Policy::Equal, Policy::Proportional, Policy::Fair]
    }

    /// Returns the non-quota allocation rule, if this policy has one.
    pub fn base_rule(&self) -> Option<BaseRule> {
        match self {
            Policy::Equal => Some(BaseRule::Equal),
            Policy::Proportional => Some(BaseRule::Proportional),
            Policy::Fair => Some(BaseRule::Fair),
            Policy::Quota | Policy::PakistanQuota => None,
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Policy {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Policy::Equal),
            "proportional" => Ok(Policy::Proportional),
            "fair" => Ok(Policy::Fair),
            "quota" => Ok(Policy::Quota),
            "pakistan-quota" => Ok(Policy::PakistanQuota),
            other => Err(SimulationError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Base allocation rule for the non-quota allocator.
///
/// The quota partitioner always applies `Fair` within each province, so
/// it never appears here as a policy of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRule {
    Equal,
    Proportional,
    Fair,
}
