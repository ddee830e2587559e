//! Final pass, dedupe and rank calibration.
//!
//! Items collapse onto their combination string. Combinations are ordered by
//! posterior and a `MID` marker is placed at the 0.5 boundary. Each side is
//! scored by its midpoint-cumulative frequency walked outward from `MID`, so
//! the most populous extreme lands on 0.0 or 1.0.

use std::collections::BTreeMap;

use serde::Serialize;
use sl_common::{DimensionSpec, Error, Pole, Result};
use sl_math::midpoint_cumulative;

use super::confusion::{ClassPrior, EmissionMatrix, EncodedItem};

/// Label used for the boundary marker.
pub const MID_LABEL: &str = "MID";

/// One distinct combination with its calibrated score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCombination {
    pub combination: String,
    pub posterior: f64,
    pub frequency: usize,
    pub score: f64,
}

/// Per-dimension result table, sorted ascending by score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftLabelTable {
    pub dimension: String,
    pub entries: Vec<ScoredCombination>,
    /// Position the `MID` marker held before it was removed.
    pub mid_index: usize,
}

impl SoftLabelTable {
    pub fn get(&self, combination: &str) -> Option<&ScoredCombination> {
        self.entries.iter().find(|e| e.combination == combination)
    }

    pub fn score_of(&self, combination: &str) -> Option<f64> {
        self.get(combination).map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of items behind the table.
    pub fn total_frequency(&self) -> usize {
        self.entries.iter().map(|e| e.frequency).sum()
    }
}

/// Concatenate an item's three raw tokens.
pub fn combination_string(spec: &DimensionSpec, item: &EncodedItem) -> String {
    item.labels.iter().map(|c| spec.decode(*c)).collect()
}

/// Final posterior per item, without the zero-denominator guard.
///
/// A zero total likelihood is reported as `DegeneratePosterior` rather than
/// producing NaN.
pub fn final_posteriors(
    spec: &DimensionSpec,
    items: &[EncodedItem],
    emission: &EmissionMatrix,
    prior: &ClassPrior,
) -> Result<Vec<f64>> {
    items
        .iter()
        .map(|item| {
            let product_a = emission.likelihood(Pole::A, &item.labels) * prior.pole_a;
            let product_b = emission.likelihood(Pole::B, &item.labels) * prior.pole_b;
            let total = product_a + product_b;
            if total == 0.0 || !total.is_finite() {
                return Err(Error::DegeneratePosterior {
                    combination: combination_string(spec, item),
                });
            }
            Ok(product_a / total)
        })
        .collect()
}

struct Row {
    combination: String,
    posterior: f64,
    frequency: usize,
}

/// Build the calibrated table from items and their final posteriors.
pub fn aggregate(spec: &DimensionSpec, items: &[EncodedItem], posteriors: &[f64]) -> SoftLabelTable {
    // Identical label triples always share a posterior, so the combination
    // alone is the dedupe key.
    let mut grouped: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (item, &posterior) in items.iter().zip(posteriors) {
        grouped
            .entry(combination_string(spec, item))
            .or_insert((posterior, 0))
            .1 += 1;
    }

    let mut rows: Vec<Row> = grouped
        .into_iter()
        .map(|(combination, (posterior, frequency))| Row {
            combination,
            posterior,
            frequency,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.posterior
            .total_cmp(&b.posterior)
            .then_with(|| a.combination.cmp(&b.combination))
    });

    let mid_index = rows
        .iter()
        .position(|r| r.posterior >= 0.5)
        .unwrap_or(rows.len());
    let (left, right) = rows.split_at(mid_index);

    let mut left_pos = midpoint_cumulative(left.iter().rev().map(|r| r.frequency as f64));
    left_pos.reverse();
    let right_pos = midpoint_cumulative(right.iter().map(|r| r.frequency as f64));

    let max_left = side_max(&left_pos);
    let max_right = side_max(&right_pos);

    let left_scores = left_pos.iter().map(|v| 0.5 - v / (2.0 * max_left));
    let right_scores = right_pos.iter().map(|v| 0.5 + v / (2.0 * max_right));

    let mut entries: Vec<ScoredCombination> = rows
        .into_iter()
        .zip(left_scores.chain(right_scores))
        .map(|(row, score)| ScoredCombination {
            combination: row.combination,
            posterior: row.posterior,
            frequency: row.frequency,
            score,
        })
        .collect();
    entries.sort_by(|a, b| a.score.total_cmp(&b.score));

    SoftLabelTable {
        dimension: spec.name().to_string(),
        entries,
        mid_index,
    }
}

/// Largest cumulative position on one side, 1 for an empty side.
fn side_max(positions: &[f64]) -> f64 {
    if positions.is_empty() {
        1.0
    } else {
        positions.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_common::{Category, Dimension};

    fn item(codes: [usize; 3]) -> EncodedItem {
        EncodedItem::new(codes.map(|c| Category::from_index(c).unwrap()))
    }

    #[test]
    fn combination_uses_vocabulary() {
        let spec = Dimension::TF.spec();
        assert_eq!(combination_string(&spec, &item([0, 2, 3])), "T+F-F+");
    }

    #[test]
    fn single_pole_a_combination_scores_one() {
        let spec = Dimension::EI.spec();
        let items = vec![item([0, 0, 0]); 10];
        let table = aggregate(&spec, &items, &[1.0; 10]);
        assert_eq!(table.mid_index, 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries[0].frequency, 10);
        assert_eq!(table.entries[0].score, 1.0);
    }

    #[test]
    fn two_sided_table() {
        let spec = Dimension::EI.spec();
        let items = vec![item([0, 0, 0]), item([3, 3, 3]), item([0, 0, 0]), item([3, 3, 3])];
        let posteriors = [0.9, 0.1, 0.9, 0.1];
        let table = aggregate(&spec, &items, &posteriors);
        assert_eq!(table.mid_index, 1);
        assert_eq!(table.entries[0].combination, "I+I+I+");
        assert_eq!(table.entries[0].score, 0.0);
        assert_eq!(table.entries[1].combination, "E+E+E+");
        assert_eq!(table.entries[1].score, 1.0);
        assert_eq!(table.total_frequency(), 4);
    }

    #[test]
    fn inner_items_sit_near_half() {
        // Left side (outer → inner): freq 3 then 1; right side: freq 1 then 3.
        let spec = Dimension::EI.spec();
        let mut items = Vec::new();
        let mut posteriors = Vec::new();
        for (codes, p, n) in [
            ([3, 3, 3], 0.05, 3),
            ([2, 3, 3], 0.4, 1),
            ([0, 1, 1], 0.6, 1),
            ([0, 0, 0], 0.95, 3),
        ] {
            for _ in 0..n {
                items.push(item(codes));
                posteriors.push(p);
            }
        }
        let table = aggregate(&spec, &items, &posteriors);
        let scores: Vec<f64> = table.entries.iter().map(|e| e.score).collect();
        // Left midpoints walked from MID: [0.5, 2.5] → reversed [2.5, 0.5], max 2.5.
        for (got, want) in scores.iter().zip([0.0, 0.4, 0.6, 1.0]) {
            assert!((got - want).abs() < 1e-12, "{scores:?}");
        }
        assert_eq!(table.mid_index, 2);
    }

    #[test]
    fn posterior_exactly_half_goes_right() {
        let spec = Dimension::SN.spec();
        let items = vec![item([1, 2, 1])];
        let table = aggregate(&spec, &items, &[0.5]);
        assert_eq!(table.mid_index, 0);
        assert_eq!(table.entries[0].score, 1.0);
    }

    #[test]
    fn degenerate_final_posterior_is_error() {
        let spec = Dimension::JP.spec();
        let items = vec![item([0, 0, 0])];
        let err = final_posteriors(
            &spec,
            &items,
            &EmissionMatrix::zeros(),
            &ClassPrior::from_pole_a(0.5),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DegeneratePosterior { ref combination } if combination == "J+J+J+"));
    }
}
