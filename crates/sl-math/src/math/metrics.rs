//! Error metrics between reference and predicted soft labels.
//!
//! Plain MAE/RMSE compare the raw values. The "S-" (scale) variants first
//! bucket both sides into equal-width bins over [0, 1] and compare bin
//! indices, which is how rating-scale predictions are scored.
//!
//! Every function returns `None` for empty or mismatched inputs.

use serde::{Deserialize, Serialize};

/// Default number of equal-width buckets for the scale metrics.
pub const DEFAULT_BUCKETS: usize = 9;

/// Supported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricName {
    #[serde(rename = "MAE")]
    Mae,
    #[serde(rename = "RMSE")]
    Rmse,
    #[serde(rename = "S-MAE")]
    SMae,
    #[serde(rename = "S-RMSE")]
    SRmse,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::Mae,
        MetricName::Rmse,
        MetricName::SMae,
        MetricName::SRmse,
    ];

    /// Compute this metric with the default bucket count.
    pub fn compute(self, y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
        match self {
            MetricName::Mae => mae(y_true, y_pred),
            MetricName::Rmse => rmse(y_true, y_pred),
            MetricName::SMae => bucket_mae(y_true, y_pred, DEFAULT_BUCKETS),
            MetricName::SRmse => bucket_rmse(y_true, y_pred, DEFAULT_BUCKETS),
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricName::Mae => write!(f, "MAE"),
            MetricName::Rmse => write!(f, "RMSE"),
            MetricName::SMae => write!(f, "S-MAE"),
            MetricName::SRmse => write!(f, "S-RMSE"),
        }
    }
}

fn paired(y_true: &[f64], y_pred: &[f64]) -> bool {
    !y_true.is_empty() && y_true.len() == y_pred.len()
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean absolute error.
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if !paired(y_true, y_pred) {
        return None;
    }
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Some(total / y_true.len() as f64)
}

/// Root mean squared error.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if !paired(y_true, y_pred) {
        return None;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    Some((total / y_true.len() as f64).sqrt())
}

/// Edge `i` of `buckets` equal-width bins over [0, 1].
///
/// Edges are `i * (1 / buckets)` with the last one pinned to exactly 1.0.
fn bucket_edge(i: usize, buckets: usize) -> f64 {
    if i == buckets {
        1.0
    } else {
        i as f64 * (1.0 / buckets as f64)
    }
}

/// Zero-based bucket index of `x`: the number of edges `<= x`, minus one.
///
/// Values below 0 map to -1 and values at or above 1.0 map to `buckets`
/// (an overflow bucket), so 1.0 is one bucket above 0.999.
pub fn bucket_index(x: f64, buckets: usize) -> i64 {
    let edges_at_or_below = (0..=buckets)
        .filter(|&i| bucket_edge(i, buckets) <= x)
        .count();
    edges_at_or_below as i64 - 1
}

fn bucketed(values: &[f64], buckets: usize) -> Vec<f64> {
    values
        .iter()
        .map(|&v| bucket_index(v, buckets) as f64)
        .collect()
}

/// MAE over bucket indices.
pub fn bucket_mae(y_true: &[f64], y_pred: &[f64], buckets: usize) -> Option<f64> {
    if buckets == 0 {
        return None;
    }
    mae(&bucketed(y_true, buckets), &bucketed(y_pred, buckets))
}

/// RMSE over bucket indices.
pub fn bucket_rmse(y_true: &[f64], y_pred: &[f64], buckets: usize) -> Option<f64> {
    if buckets == 0 {
        return None;
    }
    rmse(&bucketed(y_true, buckets), &bucketed(y_pred, buckets))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn mae_and_rmse() {
        let t = [0.0, 0.5, 1.0];
        let p = [0.5, 0.5, 0.0];
        assert!((mae(&t, &p).unwrap() - 0.5).abs() < TOL);
        assert!((rmse(&t, &p).unwrap() - (1.25f64 / 3.0).sqrt()).abs() < TOL);
    }

    #[test]
    fn mismatched_inputs() {
        assert_eq!(mae(&[], &[]), None);
        assert_eq!(rmse(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(bucket_mae(&[0.1], &[0.1], 0), None);
    }

    #[test]
    fn bucket_index_edges() {
        assert_eq!(bucket_index(0.0, 9), 0);
        assert_eq!(bucket_index(0.05, 9), 0);
        assert_eq!(bucket_index(0.12, 9), 1);
        assert_eq!(bucket_index(0.999, 9), 8);
        assert_eq!(bucket_index(1.0, 9), 9);
        assert_eq!(bucket_index(-0.1, 9), -1);
    }

    #[test]
    fn bucket_metrics_compare_bins() {
        // Same bin, different values: zero scale error.
        assert_eq!(bucket_mae(&[0.01], &[0.1], 9), Some(0.0));
        assert_eq!(bucket_mae(&[0.0, 0.5], &[0.2, 0.5], 9), Some(0.5));
        assert_eq!(bucket_rmse(&[0.0], &[0.5], 9), Some(4.0));
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn metric_names() {
        assert_eq!(MetricName::SMae.to_string(), "S-MAE");
        assert_eq!(serde_json::to_string(&MetricName::SRmse).unwrap(), "\"S-RMSE\"");
        assert_eq!(MetricName::Mae.compute(&[0.2], &[0.4]).map(|v| (v * 10.0).round()), Some(2.0));
    }
}
