//! Seed confusion counts and the emission model.
//!
//! Counts are indexed `[annotator][z_init][raw]`, where `z_init` is the
//! median code of an item's three labels. After Laplace smoothing the count
//! rows are collapsed onto the two latent poles to seed EM.

use serde::Serialize;
use sl_common::{Category, Pole, ANNOTATOR_COUNT, CATEGORY_COUNT};
use sl_config::SeedEmission;
use sl_math::{normalize_row, shares};

/// Number of latent classes (pole A, pole B).
pub const CLASS_COUNT: usize = 2;

/// One annotated item with its three labels encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedItem {
    pub labels: [Category; ANNOTATOR_COUNT],
    pub z_init: Category,
}

impl EncodedItem {
    pub fn new(labels: [Category; ANNOTATOR_COUNT]) -> Self {
        EncodedItem {
            labels,
            z_init: median_category(labels),
        }
    }

    /// Number of labels on pole A.
    pub fn pole_a_votes(&self) -> usize {
        self.labels.iter().filter(|c| c.is_pole_a()).count()
    }
}

/// Second-smallest of three codes.
pub fn median_category(labels: [Category; ANNOTATOR_COUNT]) -> Category {
    let mut sorted = labels;
    sorted.sort();
    sorted[1]
}

/// Co-occurrence counts, `[annotator][z_init][raw]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountTensor {
    counts: [[[f64; CATEGORY_COUNT]; CATEGORY_COUNT]; ANNOTATOR_COUNT],
}

impl CountTensor {
    /// Tally raw labels against each item's `z_init`.
    pub fn tally(items: &[EncodedItem]) -> Self {
        let mut counts = [[[0.0; CATEGORY_COUNT]; CATEGORY_COUNT]; ANNOTATOR_COUNT];
        for item in items {
            let row = item.z_init.index();
            for (annotator, label) in item.labels.iter().enumerate() {
                counts[annotator][row][label.index()] += 1.0;
            }
        }
        CountTensor { counts }
    }

    /// Add one to every cell.
    pub fn smoothed(mut self) -> Self {
        for cell in self.counts.iter_mut().flatten().flatten() {
            *cell += 1.0;
        }
        self
    }

    pub fn get(&self, annotator: usize, z_init: Category, raw: Category) -> f64 {
        self.counts[annotator][z_init.index()][raw.index()]
    }

    pub fn row(&self, annotator: usize, z_init: Category) -> &[f64; CATEGORY_COUNT] {
        &self.counts[annotator][z_init.index()]
    }

    /// Total mass per `z_init` row, summed over annotators and raw labels.
    pub fn row_totals(&self) -> [f64; CATEGORY_COUNT] {
        let mut totals = [0.0; CATEGORY_COUNT];
        for per_annotator in &self.counts {
            for (r, row) in per_annotator.iter().enumerate() {
                totals[r] += row.iter().sum::<f64>();
            }
        }
        totals
    }

    /// Share of the total mass in each `z_init` row.
    pub fn row_shares(&self) -> [f64; CATEGORY_COUNT] {
        let mut out = [0.0; CATEGORY_COUNT];
        for (o, s) in out.iter_mut().zip(shares(&self.row_totals())) {
            *o = s;
        }
        out
    }
}

/// Latent class prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassPrior {
    pub pole_a: f64,
    pub pole_b: f64,
}

impl ClassPrior {
    /// Prior with `pole_b = 1 - pole_a`.
    pub fn from_pole_a(pole_a: f64) -> Self {
        ClassPrior {
            pole_a,
            pole_b: 1.0 - pole_a,
        }
    }

    pub fn get(&self, pole: Pole) -> f64 {
        match pole {
            Pole::A => self.pole_a,
            Pole::B => self.pole_b,
        }
    }
}

/// Per-annotator, per-class distribution over raw labels,
/// `[annotator][class][raw]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionMatrix {
    rows: [[[f64; CATEGORY_COUNT]; CLASS_COUNT]; ANNOTATOR_COUNT],
}

impl EmissionMatrix {
    pub fn zeros() -> Self {
        EmissionMatrix {
            rows: [[[0.0; CATEGORY_COUNT]; CLASS_COUNT]; ANNOTATOR_COUNT],
        }
    }

    pub fn get(&self, annotator: usize, pole: Pole, raw: Category) -> f64 {
        self.rows[annotator][pole.index()][raw.index()]
    }

    pub fn row(&self, annotator: usize, pole: Pole) -> &[f64; CATEGORY_COUNT] {
        &self.rows[annotator][pole.index()]
    }

    pub fn row_mut(&mut self, annotator: usize, pole: Pole) -> &mut [f64; CATEGORY_COUNT] {
        &mut self.rows[annotator][pole.index()]
    }

    /// Product of the three annotators' emissions for one class.
    pub fn likelihood(&self, pole: Pole, labels: &[Category; ANNOTATOR_COUNT]) -> f64 {
        labels
            .iter()
            .enumerate()
            .map(|(annotator, label)| self.get(annotator, pole, *label))
            .product()
    }

    /// Every row as `(annotator, pole, row)`.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Pole, &[f64; CATEGORY_COUNT])> {
        self.rows.iter().enumerate().flat_map(|(a, per_class)| {
            [Pole::A, Pole::B]
                .into_iter()
                .map(move |pole| (a, pole, &per_class[pole.index()]))
        })
    }
}

/// Seed model handed to the EM loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedModel {
    pub counts: CountTensor,
    pub emission: EmissionMatrix,
    pub prior: ClassPrior,
}

/// Build the seed model from smoothed counts.
///
/// The pole-A emission row of each annotator is the share-weighted mix of the
/// `z_init` rows 0 and 1, divided by their combined share; pole B mixes rows
/// 2 and 3. With `SeedEmission::SmoothedCounts` the mixed rows are raw counts;
/// with `RowStochastic` each count row is normalized first.
///
/// `items` must be non-empty; smoothing keeps every share positive.
pub fn seed_model(items: &[EncodedItem], mode: SeedEmission) -> SeedModel {
    let counts = CountTensor::tally(items).smoothed();
    let shares = counts.row_shares();
    let prior = ClassPrior {
        pole_a: shares[0] + shares[1],
        pole_b: shares[2] + shares[3],
    };

    let mut emission = EmissionMatrix::zeros();
    for annotator in 0..ANNOTATOR_COUNT {
        for (pole, rows, mass) in [
            (Pole::A, [Category::STRONG_A, Category::WEAK_A], prior.pole_a),
            (Pole::B, [Category::WEAK_B, Category::STRONG_B], prior.pole_b),
        ] {
            let out = emission.row_mut(annotator, pole);
            for z in rows {
                let mut source = *counts.row(annotator, z);
                if mode == SeedEmission::RowStochastic {
                    normalize_row(&mut source);
                }
                let weight = shares[z.index()] / mass;
                for (o, s) in out.iter_mut().zip(source) {
                    *o += s * weight;
                }
            }
        }
    }

    SeedModel {
        counts,
        emission,
        prior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn item(codes: [usize; 3]) -> EncodedItem {
        EncodedItem::new(codes.map(|c| Category::from_index(c).unwrap()))
    }

    #[test]
    fn median_is_second_smallest() {
        assert_eq!(item([3, 0, 1]).z_init, Category::WEAK_A);
        assert_eq!(item([2, 2, 0]).z_init, Category::WEAK_B);
        assert_eq!(item([3, 3, 3]).z_init, Category::STRONG_B);
    }

    #[test]
    fn tally_and_smoothing() {
        let items = [item([0, 0, 1])];
        let counts = CountTensor::tally(&items);
        assert_eq!(counts.get(0, Category::STRONG_A, Category::STRONG_A), 1.0);
        assert_eq!(counts.get(2, Category::STRONG_A, Category::WEAK_A), 1.0);
        assert_eq!(counts.row_totals().iter().sum::<f64>(), 3.0);

        let smoothed = counts.smoothed();
        assert_eq!(smoothed.get(0, Category::STRONG_A, Category::STRONG_A), 2.0);
        assert_eq!(smoothed.get(1, Category::STRONG_B, Category::WEAK_B), 1.0);
        assert_eq!(smoothed.row_totals().iter().sum::<f64>(), 51.0);
    }

    #[test]
    fn row_shares_follow_row_totals() {
        let smoothed = CountTensor::tally(&[item([0, 0, 1]), item([3, 2, 3])]).smoothed();
        let totals = smoothed.row_totals();
        let grand: f64 = totals.iter().sum();
        let shares = smoothed.row_shares();
        for (share, total) in shares.iter().zip(totals) {
            assert!((share - total / grand).abs() < TOL);
        }
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < TOL);

        assert_eq!(CountTensor::tally(&[]).row_shares(), [0.0; 4]);
    }

    #[test]
    fn seed_for_unanimous_strong_a() {
        // Ten items of "X+X+X+": row 0 holds 3 * 11 + 3 * 3 = 42 of 78.
        let items = vec![item([0, 0, 0]); 10];
        let seed = seed_model(&items, SeedEmission::SmoothedCounts);
        let shares = seed.counts.row_shares();
        assert!((shares[0] - 42.0 / 78.0).abs() < TOL);
        assert!((seed.prior.pole_a - 54.0 / 78.0).abs() < TOL);
        assert!((seed.prior.pole_a + seed.prior.pole_b - 1.0).abs() < TOL);

        // (11 * 42 + 1 * 12) / 54 for the observed cell, 1 elsewhere.
        let row = seed.emission.row(0, Pole::A);
        assert!((row[0] - 474.0 / 54.0).abs() < TOL);
        assert!((row[1] - 1.0).abs() < TOL);
        assert_eq!(seed.emission.row(2, Pole::B), &[1.0; 4]);
    }

    #[test]
    fn row_stochastic_seed_rows_sum_to_one() {
        let items = vec![item([0, 1, 3]), item([2, 3, 3]), item([0, 0, 2])];
        let seed = seed_model(&items, SeedEmission::RowStochastic);
        for (_, _, row) in seed.emission.rows() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn likelihood_is_product_over_annotators() {
        let items = vec![item([0, 0, 0]); 10];
        let seed = seed_model(&items, SeedEmission::SmoothedCounts);
        let labels = [Category::STRONG_A; 3];
        let expected = (474.0f64 / 54.0).powi(3);
        assert!((seed.emission.likelihood(Pole::A, &labels) - expected).abs() < 1e-9);
        assert_eq!(seed.emission.likelihood(Pole::B, &labels), 1.0);
    }
}
