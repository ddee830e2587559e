//! EM soft-labeling engine.
//!
//! `fit_dimension` runs the full pipeline for one dimension: encode, seed,
//! EM, final pass, aggregate. Dimensions share no state.

pub mod aggregate;
pub mod confusion;
pub mod em;

pub use aggregate::{aggregate, final_posteriors, ScoredCombination, SoftLabelTable, MID_LABEL};
pub use confusion::{seed_model, ClassPrior, CountTensor, EmissionMatrix, EncodedItem, SeedModel};
pub use em::{run_em, EmOutcome, EmParams, IterationRecord};

use serde::Serialize;
use sl_common::{DimensionSpec, Error, Result, ANNOTATOR_COUNT};
use sl_config::validate::validate_em;
use sl_config::{EmSettings, SeedEmission};

use crate::config::config_error;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

/// EM run summary reported with each table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    pub items: usize,
    pub distinct_combinations: usize,
    pub iterations: usize,
    pub m_steps: usize,
    pub converged: bool,
    pub final_max_diff: f64,
    pub prior: ClassPrior,
    pub seed_prior: ClassPrior,
    pub seed_emission: SeedEmission,
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// Everything produced by fitting one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionFit {
    #[serde(skip)]
    pub spec: DimensionSpec,
    pub table: SoftLabelTable,
    pub diagnostics: FitDiagnostics,
    pub emission: EmissionMatrix,
    #[serde(skip)]
    pub trace: Vec<IterationRecord>,
}

impl DimensionFit {
    pub fn dimension(&self) -> &str {
        &self.table.dimension
    }
}

/// Encode raw label triples against a vocabulary.
pub fn encode_items<S: AsRef<str>>(
    spec: &DimensionSpec,
    triples: &[[S; ANNOTATOR_COUNT]],
) -> Result<Vec<EncodedItem>> {
    triples
        .iter()
        .map(|triple| {
            let mut labels = [sl_common::Category::STRONG_A; ANNOTATOR_COUNT];
            for (slot, raw) in labels.iter_mut().zip(triple) {
                *slot = spec.encode(raw.as_ref())?;
            }
            Ok(EncodedItem::new(labels))
        })
        .collect()
}

/// Fit one dimension and build its soft-label table.
pub fn fit_dimension<S: AsRef<str>>(
    spec: &DimensionSpec,
    triples: &[[S; ANNOTATOR_COUNT]],
    settings: &EmSettings,
    ctx: &LogContext,
) -> Result<DimensionFit> {
    validate_em(settings).map_err(config_error)?;
    if triples.is_empty() {
        return Err(Error::EmptyDataset {
            dimension: spec.name().to_string(),
        });
    }
    let ctx = ctx.for_dimension(spec.name());

    let items = encode_items(spec, triples)?;

    let seed = seed_model(&items, settings.seed_emission);
    let mode = settings.seed_emission.to_string();
    log_event!(
        ctx,
        INFO,
        event_names::SEED_READY,
        Stage::Seed,
        "seed model built",
        items = items.len() as u64,
        prior_a = seed.prior.pole_a,
        mode = mode.as_str()
    );

    let params = EmParams {
        tolerance: settings.tolerance,
        max_iterations: settings.max_iterations,
    };
    let outcome = run_em(&items, seed.emission, seed.prior, params, |record| {
        log_event!(
            ctx,
            DEBUG,
            event_names::EM_ITERATION,
            Stage::Iterate,
            "em iteration",
            iteration = record.iteration as u64,
            max_diff = record.max_diff,
            prior_a = record.prior.pole_a
        );
    });

    if outcome.converged {
        log_event!(
            ctx,
            INFO,
            event_names::EM_CONVERGED,
            Stage::Iterate,
            "em converged",
            iterations = outcome.iterations as u64,
            max_diff = outcome.final_max_diff
        );
    } else {
        log_event!(
            ctx,
            WARN,
            event_names::EM_EXHAUSTED,
            Stage::Iterate,
            "em stopped at iteration cap",
            iterations = outcome.iterations as u64,
            max_diff = outcome.final_max_diff
        );
    }

    let posteriors = final_posteriors(spec, &items, &outcome.emission, &outcome.prior)?;
    let table = aggregate(spec, &items, &posteriors);
    log_event!(
        ctx,
        INFO,
        event_names::AGGREGATE_DONE,
        Stage::Aggregate,
        "soft-label table built",
        combinations = table.len() as u64,
        mid_index = table.mid_index as u64
    );

    let diagnostics = FitDiagnostics {
        items: items.len(),
        distinct_combinations: table.len(),
        iterations: outcome.iterations,
        m_steps: outcome.m_steps(),
        converged: outcome.converged,
        final_max_diff: outcome.final_max_diff,
        prior: outcome.prior,
        seed_prior: seed.prior,
        seed_emission: settings.seed_emission,
        tolerance: settings.tolerance,
        max_iterations: settings.max_iterations,
    };

    Ok(DimensionFit {
        spec: spec.clone(),
        table,
        diagnostics,
        emission: outcome.emission,
        trace: outcome.trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_common::Dimension;

    fn settings(tolerance: f64, max_iterations: usize) -> EmSettings {
        EmSettings {
            tolerance,
            max_iterations,
            seed_emission: SeedEmission::SmoothedCounts,
        }
    }

    #[test]
    fn empty_input_is_error() {
        let triples: Vec<[&str; 3]> = Vec::new();
        let err = fit_dimension(
            &Dimension::EI.spec(),
            &triples,
            &settings(0.1, 10),
            &LogContext::new("run-test"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptyDataset { .. }));
    }

    #[test]
    fn unknown_label_is_error() {
        let triples = vec![["E+", "X+", "I-"]];
        let err = fit_dimension(
            &Dimension::EI.spec(),
            &triples,
            &settings(0.1, 10),
            &LogContext::new("run-test"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownCategory { ref label, .. } if label == "X+"));
    }

    #[test]
    fn invalid_settings_rejected() {
        let triples = vec![["E+", "E+", "E+"]];
        let err = fit_dimension(
            &Dimension::EI.spec(),
            &triples,
            &settings(0.0, 10),
            &LogContext::new("run-test"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn diagnostics_are_consistent() {
        let triples = vec![
            ["E+", "E-", "I+"],
            ["I-", "I+", "I+"],
            ["E+", "E+", "E-"],
            ["E-", "I-", "E-"],
        ];
        let fit = fit_dimension(
            &Dimension::EI.spec(),
            &triples,
            &settings(0.1, 50),
            &LogContext::new("run-test"),
        )
        .unwrap();
        assert_eq!(fit.dimension(), "E/I");
        assert_eq!(fit.diagnostics.items, 4);
        assert_eq!(fit.diagnostics.distinct_combinations, 4);
        assert_eq!(fit.table.total_frequency(), 4);
        assert_eq!(fit.trace.len(), fit.diagnostics.iterations);
        assert!(fit.diagnostics.iterations <= 50);
    }
}
