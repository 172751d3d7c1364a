//! Suppression of legitimate bulk payers and receivers.
//!
//! Payroll, merchant settlement, and scheduled disbursement flows are
//! near-constant in amount and near-uniform in timing. Genuine smurfing
//! carries the variance of ad-hoc human coordination, so smurfing
//! candidates whose relevant-side flow is too regular are dropped before
//! any score is assigned.

use chrono::{DateTime, Utc};

/// Guards against division by a zero mean.
const CV_EPSILON: f64 = 1e-9;

/// Regularity thresholds below which a high-fan hub is treated as a
/// legitimate bulk flow rather than a smurfing candidate.
#[derive(Debug, Clone)]
pub struct FalsePositiveThresholds {
    /// Amount coefficient of variation below which amounts count as constant.
    pub amount_cv: f64,
    /// Inter-arrival coefficient of variation below which timing counts as
    /// scheduled.
    pub delta_cv: f64,
    /// Minimum transaction count before a hub can be suppressed at all.
    pub min_count: usize,
}

impl Default for FalsePositiveThresholds {
    fn default() -> Self {
        Self {
            amount_cv: 0.1,
            delta_cv: 0.2,
            min_count: 20,
        }
    }
}

/// Whether a hub's relevant-side transactions look like a regular,
/// legitimate bulk flow. Suppression requires all three tests to pass:
/// near-constant amounts, near-uniform inter-arrival times, and enough
/// volume to judge either.
pub fn is_regular_bulk_flow(
    amounts: &[f64],
    timestamps: &[DateTime<Utc>],
    thresholds: &FalsePositiveThresholds,
) -> bool {
    if amounts.len() < thresholds.min_count {
        return false;
    }
    if coefficient_of_variation(amounts) >= thresholds.amount_cv {
        return false;
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();
    let deltas: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / 1000.0)
        .collect();
    if deltas.is_empty() {
        return false;
    }
    coefficient_of_variation(&deltas) < thresholds.delta_cv
}

/// Population standard deviation over mean, with the mean floored away
/// from zero.
fn coefficient_of_variation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| {
            let d = value - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean.max(CV_EPSILON)
}
