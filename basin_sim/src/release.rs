//! Loss-aware reservoir release computation.

/// Outcome of one day's release decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    /// Volume drawn from the reservoir
    pub released: f64,

    /// Volume surviving conveyance loss and reaching the farms
    pub delivered: f64,
}

impl Release {
    /// Conveyance loss for the day.
    pub fn conveyance_loss(&self) -> f64 {
        (self.released - self.delivered).max(0.0)
    }
}

/// Computes the day's release and delivery.
///
/// The releasable volume is capped by both the daily allocation cap
/// (already drought-adjusted by the caller) and the current reservoir
/// level. When demand fits within the loss-adjusted cap, exactly enough
/// is released to deliver it; otherwise the full cap is released.
/// Guarantees `delivered <= released <= min(max_allocation, reservoir)`.
pub fn compute_release(
    total_demand: f64,
    reservoir: f64,
    max_allocation: f64,
    loss_rate: f64,
) -> Release {
    let release_cap = max_allocation.min(reservoir);
    if release_cap <= 0.0 {
        return Release {
            released: 0.0,
            delivered: 0.0,
        };
    }
    if loss_rate >= 1.0 {
        // Everything released is lost in conveyance.
        return Release {
            released: release_cap,
            delivered: 0.0,
        };
    }

    let deliverable_cap = release_cap * (1.0 - loss_rate);
    let released = if total_demand <= deliverable_cap {
        if total_demand > 0.0 {
            total_demand / (1.0 - loss_rate)
        } else {
            0.0
        }
    } else {
        release_cap
    };

    Release {
        released,
        delivered: released * (1.0 - loss_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_cap_releases_nothing() {
        assert_eq!(
            compute_release(50.0, 0.0, 100.0, 0.1),
            Release { released: 0.0, delivered: 0.0 }
        );
        assert_eq!(
            compute_release(50.0, 500.0, 0.0, 0.1),
            Release { released: 0.0, delivered: 0.0 }
        );
    }

    #[test]
    fn test_demand_within_cap_is_delivered_exactly() {
        let release = compute_release(90.0, 1000.0, 200.0, 0.1);
        assert_relative_eq!(release.delivered, 90.0);
        assert_relative_eq!(release.released, 100.0);
        assert_relative_eq!(release.conveyance_loss(), 10.0);
    }

    #[test]
    fn test_demand_beyond_cap_releases_full_cap() {
        let release = compute_release(500.0, 1000.0, 200.0, 0.25);
        assert_relative_eq!(release.released, 200.0);
        assert_relative_eq!(release.delivered, 150.0);
    }

    #[test]
    fn test_cap_bounded_by_reservoir() {
        let release = compute_release(500.0, 80.0, 200.0, 0.0);
        assert_relative_eq!(release.released, 80.0);
        assert_relative_eq!(release.delivered, 80.0);
    }

    #[test]
    fn test_total_loss_delivers_nothing() {
        let release = compute_release(50.0, 500.0, 100.0, 1.0);
        assert_eq!(release.released, 100.0);
        assert_eq!(release.delivered, 0.0);
    }

    #[test]
    fn test_zero_demand_releases_nothing() {
        let release = compute_release(0.0, 500.0, 100.0, 0.2);
        assert_eq!(release.released, 0.0);
        assert_eq!(release.delivered, 0.0);
    }

    #[test]
    fn test_delivered_never_exceeds_released() {
        for &(demand, reservoir, cap, loss) in &[
            (10.0, 100.0, 50.0, 0.0),
            (100.0, 30.0, 50.0, 0.5),
            (0.0, 0.0, 0.0, 0.95),
            (1e6, 1e6, 1e3, 0.95),
        ] {
            let release = compute_release(demand, reservoir, cap, loss);
            assert!(release.delivered <= release.released + 1e-9);
            assert!(release.released <= cap.min(reservoir) + 1e-9);
        }
    }
}
