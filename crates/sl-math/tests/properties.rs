//! Property-based tests for sl-math numerical helpers.

use proptest::prelude::*;
use sl_math::metrics::{bucket_index, bucket_mae, mae, rmse};
use sl_math::{max_abs_diff, midpoint_cumulative, normalize_row, shares};

const TOL: f64 = 1e-10;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// Row normalization
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A row with positive mass sums to one after normalization.
    #[test]
    fn normalized_row_sums_to_one(row in prop::collection::vec(0.0..100.0f64, 4)) {
        let mut row = row;
        row[0] += 1e-3;
        prop_assert!(normalize_row(&mut row));
        let sum: f64 = row.iter().sum();
        prop_assert!(approx_eq(sum, 1.0, TOL), "sum={}", sum);
        prop_assert!(row.iter().all(|v| *v >= 0.0));
    }

    /// Normalization preserves the ratio between entries.
    #[test]
    fn normalization_preserves_ratios(a in 0.1..50.0f64, b in 0.1..50.0f64) {
        let mut row = [a, b];
        normalize_row(&mut row);
        prop_assert!(approx_eq(row[0] / row[1], a / b, 1e-9));
    }

    /// Shares of positive counts are a probability vector.
    #[test]
    fn shares_are_distribution(counts in prop::collection::vec(0.5..20.0f64, 1..10)) {
        let s = shares(&counts);
        prop_assert_eq!(s.len(), counts.len());
        prop_assert!(approx_eq(s.iter().sum::<f64>(), 1.0, TOL));
    }
}

// ============================================================================
// Cumulative midpoints
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Midpoints are strictly increasing for positive weights and the last
    /// midpoint sits half a weight below the total.
    #[test]
    fn midpoints_increase(weights in prop::collection::vec(1.0..10.0f64, 1..20)) {
        let mids = midpoint_cumulative(weights.iter().copied());
        prop_assert_eq!(mids.len(), weights.len());
        for pair in mids.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
        let total: f64 = weights.iter().sum();
        let last = weights[weights.len() - 1];
        prop_assert!(approx_eq(mids[mids.len() - 1], total - last / 2.0, TOL));
    }

    /// max_abs_diff is symmetric and zero against itself.
    #[test]
    fn max_abs_diff_symmetric(a in prop::collection::vec(-1.0..1.0f64, 0..8)) {
        let b: Vec<f64> = a.iter().map(|v| v * 0.5).collect();
        prop_assert_eq!(max_abs_diff(&a, &b), max_abs_diff(&b, &a));
        prop_assert_eq!(max_abs_diff(&a, &a), 0.0);
    }
}

// ============================================================================
// Metrics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// RMSE is never below MAE.
    #[test]
    fn rmse_bounds_mae(pairs in prop::collection::vec((0.0..1.0f64, 0.0..1.0f64), 1..30)) {
        let (t, p): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let m = mae(&t, &p).unwrap();
        let r = rmse(&t, &p).unwrap();
        prop_assert!(r + TOL >= m, "rmse={} mae={}", r, m);
    }

    /// Identical inputs score zero on every metric.
    #[test]
    fn identical_inputs_score_zero(t in prop::collection::vec(0.0..=1.0f64, 1..30)) {
        prop_assert_eq!(mae(&t, &t), Some(0.0));
        prop_assert_eq!(rmse(&t, &t), Some(0.0));
        prop_assert_eq!(bucket_mae(&t, &t, 9), Some(0.0));
    }

    /// Bucket indices are monotone in the value and stay in range on [0, 1).
    #[test]
    fn bucket_index_monotone(a in 0.0..1.0f64, b in 0.0..1.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(bucket_index(lo, 9) <= bucket_index(hi, 9));
        prop_assert!((0..9).contains(&bucket_index(lo, 9)));
    }
}
