//! Simulation runner: validation, policy resolution, and the day loop.

use crate::allocate::allocate_surface;
use crate::climate::{resolve_series, ClimateDay};
use crate::demand::effective_demand;
use crate::groundwater::GroundwaterPool;
use crate::quota::{pakistan_quota_config, QuotaPlan};
use crate::release::compute_release;
use basin_core::metrics::{depletion_risk, gini_coefficient, log_yield};
use basin_core::{
    BaseRule, DayMetrics, Farm, FarmSummary, Policy, SimulationConfig, SimulationError,
    SimulationResponse, SimulationResult, SimulationSummary,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// How one run turns delivered water into per-farm allocations.
///
/// Built once per run so quota validation happens before the first day;
/// the per-day call is infallible.
pub(crate) enum SurfaceAllocator {
    Rule(BaseRule),
    Quota(QuotaPlan),
}

impl SurfaceAllocator {
    pub(crate) fn for_policy(
        policy: Policy,
        farms: &[Farm],
        config: &SimulationConfig,
    ) -> Result<Self, SimulationError> {
        match policy.base_rule() {
            Some(rule) => Ok(SurfaceAllocator::Rule(rule)),
            None => Ok(SurfaceAllocator::Quota(QuotaPlan::new(farms, config)?)),
        }
    }

    fn allocate(&self, demands: &[f64], available: f64, fairness_weight: f64) -> Vec<f64> {
        match self {
            SurfaceAllocator::Rule(rule) => {
                allocate_surface(demands, available, *rule, fairness_weight)
            }
            SurfaceAllocator::Quota(plan) => plan.allocate(demands, available),
        }
    }
}

/// Structural farm-list validation: non-empty, unique ids.
pub(crate) fn validate_farms(farms: &[Farm]) -> Result<(), SimulationError> {
    if farms.is_empty() {
        return Err(SimulationError::NoFarms);
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for farm in farms {
        if !seen.insert(farm.id.as_str()) {
            duplicates.insert(farm.id.as_str());
        }
    }
    if !duplicates.is_empty() {
        let duplicates: Vec<&str> = duplicates.into_iter().collect();
        return Err(SimulationError::DuplicateFarmIds(duplicates.join(", ")));
    }
    Ok(())
}

/// Resolves `pakistan-quota` into a plain quota run (validating the
/// province set and deriving default quotas); other policies pass
/// through untouched.
pub(crate) fn resolve_policy(
    farms: &[Farm],
    config: &SimulationConfig,
    policy: Policy,
) -> Result<(SimulationConfig, Policy), SimulationError> {
    if policy == Policy::PakistanQuota {
        Ok((pakistan_quota_config(farms, config)?, Policy::Quota))
    } else {
        Ok((config.clone(), policy))
    }
}

/// Runs the day loop for one policy over a pre-resolved climate series.
///
/// Per day: rainfall tops up the reservoir (capped at capacity), the
/// groundwater pool recharges, demands and the loss-aware release are
/// computed, surface water is allocated, groundwater tops up unmet
/// demand, and the reservoir is decremented by the full release -
/// conveyance loss comes out of the reservoir, not out of the farms.
pub(crate) fn simulate_policy(
    farms: &[Farm],
    config: &SimulationConfig,
    policy: Policy,
    allocator: &SurfaceAllocator,
    climate: &[ClimateDay],
) -> SimulationResult {
    let capacity = config.reservoir_capacity;
    let mut reservoir = config.initial_reservoir.min(capacity);
    let mut groundwater = GroundwaterPool::new(config);
    let threshold = config.sustainability_threshold_volume();

    let n = farms.len();
    let mut farm_allocation_totals = vec![0.0; n];
    let mut farm_yield_totals = vec![0.0; n];
    let mut farm_unmet_totals = vec![0.0; n];
    let mut total_conveyance_loss = 0.0;
    let mut total_groundwater_used = 0.0;

    let mut daily = Vec::with_capacity(climate.len());

    for (day_index, day) in climate.iter().enumerate() {
        let reservoir_start = reservoir;
        reservoir = (reservoir + day.rainfall).min(capacity);
        groundwater.recharge();

        let mut max_allocation = config.max_daily_allocation;
        if day.drought {
            max_allocation *= config.drought_multiplier;
        }

        let demands: Vec<f64> = farms
            .iter()
            .map(|farm| effective_demand(farm, day.drought, config))
            .collect();
        let total_demand: f64 = demands.iter().sum();

        let release = compute_release(
            total_demand,
            reservoir,
            max_allocation,
            config.conveyance_loss_rate,
        );
        let conveyance_loss = release.conveyance_loss();
        total_conveyance_loss += conveyance_loss;

        let surface = allocator.allocate(&demands, release.delivered, config.fairness_weight);
        let unmet: Vec<f64> = demands
            .iter()
            .zip(&surface)
            .map(|(demand, allocation)| (demand - allocation).max(0.0))
            .collect();

        let (groundwater_used, ground) = groundwater.pump(&unmet);
        total_groundwater_used += groundwater_used;

        let allocations: Vec<f64> = surface
            .iter()
            .zip(&ground)
            .map(|(surface, ground)| surface + ground)
            .collect();
        let total_allocated: f64 = allocations.iter().sum();

        reservoir = (reservoir - release.released).max(0.0);

        let mut total_yield = 0.0;
        for (i, farm) in farms.iter().enumerate() {
            let farm_yield = log_yield(farm.yield_coefficient, allocations[i]);
            total_yield += farm_yield;
            farm_allocation_totals[i] += allocations[i];
            farm_yield_totals[i] += farm_yield;
            farm_unmet_totals[i] += (demands[i] - allocations[i]).max(0.0);
        }

        let gini = gini_coefficient(&allocations);
        let risk = depletion_risk(reservoir, threshold);

        let groundwater_penalty = if config.groundwater_penalty_weight > 0.0 {
            let denominator = if config.groundwater_capacity > 0.0 {
                config.groundwater_capacity
            } else {
                1.0
            };
            config.groundwater_penalty_weight * groundwater_used / denominator
        } else {
            0.0
        };
        let score = total_yield - config.alpha * risk - config.beta * gini - groundwater_penalty;

        daily.push(DayMetrics {
            day: (day_index + 1) as u32,
            rainfall: day.rainfall,
            drought: day.drought,
            reservoir_start,
            reservoir_end: reservoir,
            groundwater_end: groundwater.level(),
            total_allocated,
            total_yield,
            conveyance_loss,
            groundwater_used,
            gini,
            depletion_risk: risk,
            score,
        });
    }

    let days = config.days.max(1) as f64;
    let avg_gini = daily.iter().map(|d| d.gini).sum::<f64>() / days;
    let avg_depletion_risk = daily.iter().map(|d| d.depletion_risk).sum::<f64>() / days;
    let total_yield = daily.iter().map(|d| d.total_yield).sum::<f64>();

    let summary = SimulationSummary {
        policy,
        total_yield,
        avg_gini,
        avg_depletion_risk,
        final_reservoir: reservoir,
        final_groundwater: groundwater.level(),
        sustainability_score: (1.0 - avg_depletion_risk).max(0.0),
        total_conveyance_loss,
        total_groundwater_used,
    };

    let farm_summaries = farms
        .iter()
        .enumerate()
        .map(|(i, farm)| FarmSummary {
            id: farm.id.clone(),
            crop_type: farm.crop_type.clone(),
            total_allocated: farm_allocation_totals[i],
            total_yield: farm_yield_totals[i],
            average_allocation: farm_allocation_totals[i] / days,
            average_yield: farm_yield_totals[i] / days,
            unmet_demand_total: farm_unmet_totals[i],
        })
        .collect();

    SimulationResult {
        summary,
        daily,
        farms: farm_summaries,
    }
}

/// Runs one full simulation: the requested policy, plus - when asked -
/// every remaining standard policy on the identical climate series.
///
/// All validation happens before the first simulated day.
pub fn run_simulation(
    farms: &[Farm],
    config: &SimulationConfig,
    policy: Policy,
    compare_policies: bool,
) -> Result<SimulationResponse, SimulationError> {
    validate_farms(farms)?;
    config.validate()?;

    let (config, resolved) = resolve_policy(farms, config, policy)?;
    let allocator = SurfaceAllocator::for_policy(resolved, farms, &config)?;
    let climate = resolve_series(&config)?;

    info!(
        policy = %resolved,
        days = config.days,
        farms = farms.len(),
        compare = compare_policies,
        "running simulation"
    );

    let primary = simulate_policy(farms, &config, resolved, &allocator, &climate);

    let mut comparisons = Vec::new();
    if compare_policies {
        for comparison in Policy::comparison_set() {
            if comparison == resolved {
                continue;
            }
            if let Some(rule) = comparison.base_rule() {
                debug!(policy = %comparison, "running comparison policy");
                let allocator = SurfaceAllocator::Rule(rule);
                comparisons.push(simulate_policy(
                    farms,
                    &config,
                    comparison,
                    &allocator,
                    &climate,
                ));
            }
        }
    }

    Ok(SimulationResponse {
        primary,
        comparisons,
    })
}
