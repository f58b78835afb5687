//! Surface-water allocation and shortfall redistribution.

use basin_core::BaseRule;

/// Numerical floor below which leftover water is considered spent.
const LEFTOVER_EPSILON: f64 = 1e-6;

/// Numerical floor below which an iteration is considered stalled.
const PROGRESS_EPSILON: f64 = 1e-9;

/// Distributes `available` water across farms under a base rule, caps
/// each share at the farm's demand, then water-fills any leftover.
///
/// Every entry of the result is in `[0, demand]` and the total never
/// exceeds `available` (beyond float noise).
pub fn allocate_surface(
    demands: &[f64],
    available: f64,
    rule: BaseRule,
    fairness_weight: f64,
) -> Vec<f64> {
    let n = demands.len();
    if n == 0 || available <= 0.0 {
        return vec![0.0; n];
    }
    let total_demand: f64 = demands.iter().sum();
    if total_demand <= 0.0 {
        return vec![0.0; n];
    }

    let equal_share = available / n as f64;
    let base: Vec<f64> = match rule {
        BaseRule::Equal => vec![equal_share; n],
        BaseRule::Proportional => demands
            .iter()
            .map(|demand| available * demand / total_demand)
            .collect(),
        BaseRule::Fair => demands
            .iter()
            .map(|demand| {
                let proportional = available * demand / total_demand;
                (1.0 - fairness_weight) * proportional + fairness_weight * equal_share
            })
            .collect(),
    };

    let mut allocations: Vec<f64> = base
        .iter()
        .zip(demands)
        .map(|(share, demand)| share.min(*demand))
        .collect();
    redistribute_leftover(&mut allocations, demands, available);
    allocations
}

/// Water-filling refinement: repeatedly splits the leftover evenly
/// across farms still below demand, capping each addition at the farm's
/// remaining gap.
///
/// Terminates in at most `n + 1` iterations: each pass either fully
/// satisfies at least one farm (shrinking the unmet set) or absorbs the
/// whole even share everywhere (exhausting the leftover). The explicit
/// iteration cap backs up that argument against float stalls, and the
/// `PROGRESS_EPSILON` check stops passes that can no longer move water.
pub fn redistribute_leftover(allocations: &mut [f64], demands: &[f64], available: f64) {
    let mut leftover = available - allocations.iter().sum::<f64>();
    let mut unmet: Vec<usize> = (0..demands.len())
        .filter(|&i| allocations[i] < demands[i])
        .collect();

    let max_iterations = demands.len() + 1;
    for _ in 0..max_iterations {
        if leftover <= LEFTOVER_EPSILON || unmet.is_empty() {
            break;
        }
        let share = leftover / unmet.len() as f64;
        let mut used = 0.0;
        for &i in &unmet {
            let gap = demands[i] - allocations[i];
            if gap <= 0.0 {
                continue;
            }
            let add = share.min(gap);
            allocations[i] += add;
            used += add;
        }
        if used <= PROGRESS_EPSILON {
            break;
        }
        leftover -= used;
        unmet.retain(|&i| allocations[i] < demands[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_equal_policy_splits_evenly() {
        let allocations = allocate_surface(&[50.0, 50.0, 50.0], 90.0, BaseRule::Equal, 0.5);
        for allocation in &allocations {
            assert_relative_eq!(*allocation, 30.0);
        }
    }

    #[test]
    fn test_proportional_policy_exact_shares() {
        let allocations = allocate_surface(&[20.0, 80.0], 60.0, BaseRule::Proportional, 0.5);
        assert_relative_eq!(allocations[0], 12.0);
        assert_relative_eq!(allocations[1], 48.0);
    }

    #[test]
    fn test_fair_policy_blends_toward_equal() {
        let demands = [20.0, 80.0];
        let proportional = allocate_surface(&demands, 60.0, BaseRule::Proportional, 0.5);
        let fair = allocate_surface(&demands, 60.0, BaseRule::Fair, 0.5);
        // Blend gives base [21, 39]; the low-demand farm is capped at
        // its demand of 20 and the spare 1 water-fills to farm 1.
        assert_relative_eq!(fair[0], 20.0);
        assert_relative_eq!(fair[1], 40.0);
        assert!(fair[0] > proportional[0]);
        assert!(fair[1] < proportional[1]);
        // Weight 0 collapses to proportional
        let collapsed = allocate_surface(&demands, 60.0, BaseRule::Fair, 0.0);
        assert_relative_eq!(collapsed[0], proportional[0]);
    }

    #[test]
    fn test_leftover_flows_to_unmet_farms() {
        // Equal split gives 40 each; farm 0 only wants 10, so the spare
        // 30 flows to farm 1.
        let allocations = allocate_surface(&[10.0, 100.0], 80.0, BaseRule::Equal, 0.5);
        assert_relative_eq!(allocations[0], 10.0);
        assert_relative_eq!(allocations[1], 70.0);
    }

    #[test]
    fn test_abundance_meets_all_demand() {
        let demands = [10.0, 20.0, 30.0];
        let allocations = allocate_surface(&demands, 1000.0, BaseRule::Equal, 0.5);
        for (allocation, demand) in allocations.iter().zip(&demands) {
            assert_relative_eq!(*allocation, *demand);
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(allocate_surface(&[], 100.0, BaseRule::Equal, 0.5).is_empty());
        assert_eq!(
            allocate_surface(&[10.0, 20.0], 0.0, BaseRule::Fair, 0.5),
            vec![0.0, 0.0]
        );
        assert_eq!(
            allocate_surface(&[0.0, 0.0], 100.0, BaseRule::Proportional, 0.5),
            vec![0.0, 0.0]
        );
    }

    proptest! {
        #[test]
        fn prop_allocations_bounded_by_demand(
            demands in proptest::collection::vec(0.0..1000.0f64, 1..40),
            available in 0.0..5000.0f64,
            fairness_weight in 0.0..=1.0f64,
        ) {
            for rule in [BaseRule::Equal, BaseRule::Proportional, BaseRule::Fair] {
                let allocations = allocate_surface(&demands, available, rule, fairness_weight);
                prop_assert_eq!(allocations.len(), demands.len());
                for (allocation, demand) in allocations.iter().zip(&demands) {
                    prop_assert!(*allocation >= 0.0);
                    prop_assert!(*allocation <= demand + 1e-6);
                }
            }
        }

        #[test]
        fn prop_conservation_and_exhaustion(
            demands in proptest::collection::vec(0.0..1000.0f64, 1..40),
            available in 0.1..5000.0f64,
        ) {
            let total_demand: f64 = demands.iter().sum();
            let allocations = allocate_surface(&demands, available, BaseRule::Fair, 0.5);
            let total: f64 = allocations.iter().sum();
            // Never hands out more than available, and when demand is
            // positive it uses min(available, total_demand) up to epsilon.
            prop_assert!(total <= available + 1e-6);
            if total_demand > 0.0 {
                prop_assert!((total - available.min(total_demand)).abs() < 1e-4);
            }
        }

        #[test]
        fn prop_redistribution_never_increases_leftover(
            demands in proptest::collection::vec(0.0..1000.0f64, 1..40),
            available in 0.0..5000.0f64,
        ) {
            let mut allocations: Vec<f64> =
                demands.iter().map(|d| (available / demands.len() as f64).min(*d)).collect();
            let before = available - allocations.iter().sum::<f64>();
            redistribute_leftover(&mut allocations, &demands, available);
            let after = available - allocations.iter().sum::<f64>();
            prop_assert!(after <= before + 1e-9);
        }
    }
}
