//! Scoring math: inequality, depletion risk, yield, and run statistics.

use crate::models::StressMetric;

/// Gini coefficient of an allocation vector, clamped to [0, 1].
///
/// Returns 0 for empty input or a non-positive total, so an all-zero
/// allocation day counts as perfectly equal rather than undefined.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let cumulative: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, value)| (i + 1) as f64 * value)
        .sum();

    let n = n as f64;
    let gini = (2.0 * cumulative) / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

/// Normalized shortfall of the reservoir below the sustainability
/// threshold (in volume units). 0 when at or above the threshold.
pub fn depletion_risk(reservoir: f64, threshold: f64) -> f64 {
    if threshold > 0.0 && reservoir < threshold {
        (threshold - reservoir) / threshold
    } else {
        0.0
    }
}

/// Diminishing-returns production function: `coefficient * ln(allocation + 1)`.
pub fn log_yield(coefficient: f64, allocation: f64) -> f64 {
    coefficient * (allocation + 1.0).ln()
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

impl StressMetric {
    /// Reduces a sample vector into mean / p10 / p90 / min / max.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                p10: 0.0,
                p90: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Self {
            mean,
            p10: quantile(samples, 0.1),
            p90: quantile(samples, 0.9),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
