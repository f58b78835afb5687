//! Province-quota partitioning.
//!
//! The quota policies split available water across provinces before
//! delegating to the fair allocator within each province, then run one
//! cross-province redistribution pass so leftover water in a satisfied
//! province can still reach unmet farms elsewhere.

use crate::allocate::{allocate_surface, redistribute_leftover};
use basin_core::{BaseRule, Farm, QuotaMode, SimulationConfig, SimulationError};
use std::collections::BTreeMap;

/// Provinces accepted by the `pakistan-quota` policy.
pub const PAKISTAN_PROVINCES: [&str; 4] =
    ["Punjab", "Sindh", "Khyber Pakhtunkhwa", "Balochistan"];

/// A validated quota partitioning plan, built once per run.
///
/// Construction performs all quota-policy validation (province labels on
/// every farm, a usable quota map), so the per-day `allocate` call is
/// infallible. Province iteration uses sorted maps, keeping runs
/// reproducible regardless of quota-map insertion order.
#[derive(Debug, Clone)]
pub struct QuotaPlan {
    /// Farm indices grouped by province, sorted by province name
    groups: BTreeMap<String, Vec<usize>>,

    /// Non-negative quota values by province
    quotas: BTreeMap<String, f64>,

    /// Sum of quota values, positive by construction
    total_quota: f64,

    mode: QuotaMode,
    fairness_weight: f64,
}

impl QuotaPlan {
    /// Builds a plan from the farm list and config, validating the
    /// quota inputs.
    pub fn new(farms: &[Farm], config: &SimulationConfig) -> Result<Self, SimulationError> {
        let quotas = config
            .province_quotas
            .as_ref()
            .ok_or(SimulationError::MissingQuotas)?;

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, farm) in farms.iter().enumerate() {
            let province = farm
                .province
                .as_ref()
                .filter(|province| !province.is_empty())
                .ok_or(SimulationError::MissingProvince)?;
            groups.entry(province.clone()).or_default().push(index);
        }

        let quotas: BTreeMap<String, f64> = quotas
            .iter()
            .map(|(province, value)| (province.clone(), value.max(0.0)))
            .collect();
        let total_quota: f64 = quotas.values().sum();
        if total_quota <= 0.0 {
            return Err(SimulationError::NonPositiveQuotas);
        }

        Ok(Self {
            groups,
            quotas,
            total_quota,
            mode: config.quota_mode,
            fairness_weight: config.fairness_weight,
        })
    }

    /// Per-province cap for the given available volume.
    fn province_cap(&self, province: &str, available: f64) -> f64 {
        let quota = self.quotas.get(province).copied().unwrap_or(0.0);
        match self.mode {
            // Normalized fraction of what is available today.
            QuotaMode::Share => available * quota / self.total_quota,
            // Absolute cap, scaled down proportionally under scarcity.
            QuotaMode::Absolute => quota * (available / self.total_quota).min(1.0),
        }
    }

    /// Splits `available` across provinces, allocates fairly within
    /// each, then redistributes leftover across all farms.
    pub fn allocate(&self, demands: &[f64], available: f64) -> Vec<f64> {
        let mut allocations = vec![0.0; demands.len()];

        for (province, indices) in &self.groups {
            let cap = self.province_cap(province, available);
            let province_demands: Vec<f64> = indices.iter().map(|&i| demands[i]).collect();
            let province_allocations =
                allocate_surface(&province_demands, cap, BaseRule::Fair, self.fairness_weight);
            for (&index, allocation) in indices.iter().zip(province_allocations) {
                allocations[index] = allocation;
            }
        }

        redistribute_leftover(&mut allocations, demands, available);
        allocations
    }
}

/// Resolves the `pakistan-quota` policy into a plain quota config:
/// validates provinces against the fixed four-name set and derives
/// equal share quotas when none are supplied.
pub fn pakistan_quota_config(
    farms: &[Farm],
    config: &SimulationConfig,
) -> Result<SimulationConfig, SimulationError> {
    let mut provinces: Vec<&str> = Vec::with_capacity(farms.len());
    for farm in farms {
        let province = farm
            .province
            .as_deref()
            .filter(|province| !province.is_empty())
            .ok_or(SimulationError::MissingProvince)?;
        provinces.push(province);
    }

    let mut unique: Vec<&str> = provinces.clone();
    unique.sort_unstable();
    unique.dedup();

    let invalid: Vec<&str> = unique
        .iter()
        .copied()
        .filter(|province| !PAKISTAN_PROVINCES.contains(province))
        .collect();
    if !invalid.is_empty() {
        return Err(SimulationError::InvalidProvince(invalid.join(", ")));
    }

    if let Some(quotas) = &config.province_quotas {
        let invalid_keys: Vec<&str> = quotas
            .keys()
            .map(String::as_str)
            .filter(|province| !PAKISTAN_PROVINCES.contains(province))
            .collect();
        if !invalid_keys.is_empty() {
            return Err(SimulationError::InvalidQuotaProvince(invalid_keys.join(", ")));
        }
        return Ok(config.clone());
    }

    let share = 1.0 / unique.len() as f64;
    let quotas: BTreeMap<String, f64> = unique
        .into_iter()
        .map(|province| (province.to_string(), share))
        .collect();
    Ok(config.with_quotas(quotas, QuotaMode::Share))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn farm(id: &str, base_demand: f64, province: Option<&str>) -> Farm {
        Farm {
            id: id.to_string(),
            crop_type: "wheat".to_string(),
            base_demand,
            yield_coefficient: 1.0,
            resilience: 0.5,
            province: province.map(str::to_string),
        }
    }

    fn quota_config(quotas: &[(&str, f64)], mode: QuotaMode) -> SimulationConfig {
        let mut config: SimulationConfig = serde_json::from_str(
            r#"{
                "reservoir_capacity": 1000.0,
                "initial_reservoir": 800.0,
                "max_daily_allocation": 100.0
            }"#,
        )
        .unwrap();
        config.province_quotas = Some(
            quotas
                .iter()
                .map(|(province, value)| (province.to_string(), *value))
                .collect(),
        );
        config.quota_mode = mode;
        config
    }

    #[test]
    fn test_share_mode_caps_by_normalized_quota() {
        let farms = [farm("a", 100.0, Some("A")), farm("b", 100.0, Some("B"))];
        let config = quota_config(&[("A", 0.6), ("B", 0.4)], QuotaMode::Share);
        let plan = QuotaPlan::new(&farms, &config).unwrap();

        // Both farms are cap-bound, so allocations equal the caps.
        let allocations = plan.allocate(&[100.0, 100.0], 50.0);
        assert_relative_eq!(allocations[0], 30.0);
        assert_relative_eq!(allocations[1], 20.0);
    }

    #[test]
    fn test_share_mode_normalizes_unscaled_quotas() {
        let farms = [farm("a", 100.0, Some("A")), farm("b", 100.0, Some("B"))];
        // 3:1 instead of fractions; normalization makes them 0.75/0.25.
        let config = quota_config(&[("A", 3.0), ("B", 1.0)], QuotaMode::Share);
        let plan = QuotaPlan::new(&farms, &config).unwrap();

        let allocations = plan.allocate(&[100.0, 100.0], 40.0);
        assert_relative_eq!(allocations[0], 30.0);
        assert_relative_eq!(allocations[1], 10.0);
    }

    #[test]
    fn test_absolute_mode_scales_down_under_scarcity() {
        let farms = [farm("a", 100.0, Some("A")), farm("b", 100.0, Some("B"))];
        let config = quota_config(&[("A", 60.0), ("B", 40.0)], QuotaMode::Absolute);
        let plan = QuotaPlan::new(&farms, &config).unwrap();

        // Only 50 available against 100 of caps: scale = 0.5.
        let allocations = plan.allocate(&[100.0, 100.0], 50.0);
        assert_relative_eq!(allocations[0], 30.0);
        assert_relative_eq!(allocations[1], 20.0);

        // Under abundance the per-province caps still start at [60, 40],
        // but the final cross-province pass water-fills the leftover up
        // to each farm's demand.
        let allocations = plan.allocate(&[100.0, 100.0], 500.0);
        assert_relative_eq!(allocations[0], 100.0);
        assert_relative_eq!(allocations[1], 100.0);
    }

    #[test]
    fn test_cross_province_redistribution() {
        let farms = [farm("a", 10.0, Some("A")), farm("b", 100.0, Some("B"))];
        let config = quota_config(&[("A", 0.5), ("B", 0.5)], QuotaMode::Share);
        let plan = QuotaPlan::new(&farms, &config).unwrap();

        // Province A only absorbs 10 of its 30 cap; the spare 20 flows
        // across the province boundary to farm b.
        let allocations = plan.allocate(&[10.0, 100.0], 60.0);
        assert_relative_eq!(allocations[0], 10.0);
        assert_relative_eq!(allocations[1], 50.0);
    }

    #[test]
    fn test_quota_validation_errors() {
        let farms = [farm("a", 10.0, Some("A")), farm("b", 10.0, None)];
        let config = quota_config(&[("A", 1.0)], QuotaMode::Share);
        assert!(matches!(
            QuotaPlan::new(&farms, &config),
            Err(SimulationError::MissingProvince)
        ));

        let farms = [farm("a", 10.0, Some("A"))];
        let mut config = quota_config(&[("A", 1.0)], QuotaMode::Share);
        config.province_quotas = None;
        assert!(matches!(
            QuotaPlan::new(&farms, &config),
            Err(SimulationError::MissingQuotas)
        ));

        let config = quota_config(&[("A", 0.0), ("B", -2.0)], QuotaMode::Share);
        assert!(matches!(
            QuotaPlan::new(&farms, &config),
            Err(SimulationError::NonPositiveQuotas)
        ));
    }

    #[test]
    fn test_pakistan_defaults_derive_equal_shares() {
        let farms = [
            farm("a", 10.0, Some("Punjab")),
            farm("b", 10.0, Some("Sindh")),
            farm("c", 10.0, Some("Punjab")),
        ];
        let mut config = quota_config(&[], QuotaMode::Absolute);
        config.province_quotas = None;

        let resolved = pakistan_quota_config(&farms, &config).unwrap();
        let quotas = resolved.province_quotas.unwrap();
        assert_eq!(quotas.len(), 2);
        assert_relative_eq!(quotas["Punjab"], 0.5);
        assert_relative_eq!(quotas["Sindh"], 0.5);
        assert_eq!(resolved.quota_mode, QuotaMode::Share);
    }

    #[test]
    fn test_pakistan_rejects_unknown_provinces() {
        let farms = [farm("a", 10.0, Some("Atlantis"))];
        let mut config = quota_config(&[], QuotaMode::Share);
        config.province_quotas = None;
        assert!(matches!(
            pakistan_quota_config(&farms, &config),
            Err(SimulationError::InvalidProvince(_))
        ));

        let farms = [farm("a", 10.0, Some("Punjab"))];
        let config = quota_config(&[("Narnia", 1.0)], QuotaMode::Share);
        assert!(matches!(
            pakistan_quota_config(&farms, &config),
            Err(SimulationError::InvalidQuotaProvince(_))
        ));
    }

    #[test]
    fn test_pakistan_keeps_supplied_quotas() {
        let farms = [farm("a", 10.0, Some("Punjab")), farm("b", 10.0, Some("Sindh"))];
        let config = quota_config(&[("Punjab", 0.7), ("Sindh", 0.3)], QuotaMode::Share);
        let resolved = pakistan_quota_config(&farms, &config).unwrap();
        assert_relative_eq!(resolved.province_quotas.unwrap()["Punjab"], 0.7);
    }
}
