//! Numerically careful primitives for the EM estimator.
//!
//! The estimator works on tiny dense tensors, so nothing here is about speed.
//! These helpers pin down the exact boundary behaviour (zero-mass rows,
//! zero denominators, empty slices) that the algorithm depends on.

/// Divide every entry of `row` by the row sum.
///
/// Rows with zero (or non-positive) mass are left untouched and `false` is
/// returned; the caller treats such a row as "no evidence".
pub fn normalize_row(row: &mut [f64]) -> bool {
    let sum: f64 = row.iter().sum();
    if sum > 0.0 {
        for v in row.iter_mut() {
            *v /= sum;
        }
        true
    } else {
        false
    }
}

/// `numerator / denominator`, dividing by 1 instead when the denominator is
/// exactly zero.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Fraction of each entry in the total.
///
/// Returns an empty vector when the total is not positive.
pub fn shares(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        counts.iter().map(|c| c / total).collect()
    } else {
        Vec::new()
    }
}

/// Largest absolute element-wise difference between two equal-length slices.
///
/// Returns 0.0 for empty input and NaN for mismatched lengths.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::NAN;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Running "centre of bin" cumulative sum.
///
/// For each weight, emits the average of the cumulative total before and
/// after adding it: weights `[2, 4]` give `[1, 4]`. This turns discrete
/// frequency jumps into a continuous rank position.
pub fn midpoint_cumulative<I>(weights: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut previous = 0.0;
    weights
        .into_iter()
        .map(|w| {
            let cumulative = previous + w;
            let mid = (previous + cumulative) / 2.0;
            previous = cumulative;
            mid
        })
        .collect()
}
