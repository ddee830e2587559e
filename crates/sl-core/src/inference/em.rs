//! EM refinement of the emission model and class prior.
//!
//! Each iteration runs, in order: E-step, hard-threshold prior update,
//! convergence check, M-step. A converged iteration skips its M-step, so the
//! returned emission is the one that produced the final posteriors.

use serde::Serialize;
use sl_common::{Category, Pole, ANNOTATOR_COUNT};
use sl_math::{guarded_ratio, max_abs_diff, normalize_row};

use super::confusion::{ClassPrior, EmissionMatrix, EncodedItem};

/// Loop limits. The caller always supplies both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmParams {
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// Summary of one EM iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Largest posterior change against the previous iteration.
    pub max_diff: f64,
    /// Prior after this iteration's update.
    pub prior: ClassPrior,
    pub min_posterior: f64,
    pub max_posterior: f64,
    /// Whether an M-step followed.
    pub m_step: bool,
}

/// Result of the EM loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmOutcome {
    pub emission: EmissionMatrix,
    pub prior: ClassPrior,
    /// Posteriors from the last E-step.
    pub posteriors: Vec<f64>,
    /// Number of E-steps run.
    pub iterations: usize,
    pub converged: bool,
    pub final_max_diff: f64,
    pub trace: Vec<IterationRecord>,
}

impl EmOutcome {
    /// Number of M-steps applied.
    pub fn m_steps(&self) -> usize {
        self.trace.iter().filter(|r| r.m_step).count()
    }
}

/// Iteration-0 posteriors: 1 where `z_init` is on pole A, else 0.
pub fn baseline_posteriors(items: &[EncodedItem]) -> Vec<f64> {
    items
        .iter()
        .map(|item| if item.z_init.is_pole_a() { 1.0 } else { 0.0 })
        .collect()
}

/// Class-A posterior for one item. A zero total likelihood divides by one.
pub fn item_posterior(
    emission: &EmissionMatrix,
    prior: &ClassPrior,
    labels: &[Category; ANNOTATOR_COUNT],
) -> f64 {
    let product_a = emission.likelihood(Pole::A, labels) * prior.pole_a;
    let product_b = emission.likelihood(Pole::B, labels) * prior.pole_b;
    guarded_ratio(product_a, product_a + product_b)
}

/// E-step over every item.
pub fn e_step(items: &[EncodedItem], emission: &EmissionMatrix, prior: &ClassPrior) -> Vec<f64> {
    items
        .iter()
        .map(|item| item_posterior(emission, prior, &item.labels))
        .collect()
}

/// Prior as the fraction of items with posterior strictly above 0.5.
pub fn update_prior(posteriors: &[f64]) -> ClassPrior {
    if posteriors.is_empty() {
        return ClassPrior::from_pole_a(0.0);
    }
    let above = posteriors.iter().filter(|p| **p > 0.5).count();
    ClassPrior::from_pole_a(above as f64 / posteriors.len() as f64)
}

/// M-step: soft counts per annotator and raw label, rows normalized.
///
/// Rows with no mass stay all-zero.
pub fn m_step(items: &[EncodedItem], posteriors: &[f64]) -> EmissionMatrix {
    let mut emission = EmissionMatrix::zeros();
    for (item, &r) in items.iter().zip(posteriors) {
        for (annotator, label) in item.labels.iter().enumerate() {
            emission.row_mut(annotator, Pole::A)[label.index()] += r;
            emission.row_mut(annotator, Pole::B)[label.index()] += 1.0 - r;
        }
    }
    for annotator in 0..ANNOTATOR_COUNT {
        for pole in [Pole::A, Pole::B] {
            normalize_row(emission.row_mut(annotator, pole));
        }
    }
    emission
}

/// Run EM from a seed emission and prior.
///
/// `observe` is called once per iteration, after the convergence decision.
pub fn run_em<F>(
    items: &[EncodedItem],
    emission: EmissionMatrix,
    prior: ClassPrior,
    params: EmParams,
    mut observe: F,
) -> EmOutcome
where
    F: FnMut(&IterationRecord),
{
    let mut emission = emission;
    let mut prior = prior;
    let mut previous = baseline_posteriors(items);
    let mut posteriors = previous.clone();
    let mut trace = Vec::new();
    let mut converged = false;
    let mut final_max_diff = f64::NAN;

    while trace.len() < params.max_iterations {
        posteriors = e_step(items, &emission, &prior);
        prior = update_prior(&posteriors);
        let diff = max_abs_diff(&posteriors, &previous);
        final_max_diff = diff;
        converged = diff < params.tolerance;

        let record = IterationRecord {
            iteration: trace.len() + 1,
            max_diff: diff,
            prior,
            min_posterior: posteriors.iter().copied().fold(f64::INFINITY, f64::min),
            max_posterior: posteriors.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            m_step: !converged,
        };
        observe(&record);
        trace.push(record);

        if converged {
            break;
        }
        emission = m_step(items, &posteriors);
        previous.clone_from(&posteriors);
    }

    EmOutcome {
        emission,
        prior,
        posteriors,
        iterations: trace.len(),
        converged,
        final_max_diff,
        trace,
    }
}
