//! Compare predicted soft labels against reference soft labels.
//!
//! Truth and prediction files are paired line by line. Each dimension gets
//! the four metrics from `sl_math::metrics`, and optionally the same metrics
//! for a constant predictor equal to the mean of the truth values.

use serde::Serialize;
use sl_common::{Dimension, Error, Result};
use sl_math::metrics::{self, MetricName};

use crate::dataset::Dataset;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

/// The four metrics for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSet {
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "S-MAE")]
    pub s_mae: f64,
    #[serde(rename = "S-RMSE")]
    pub s_rmse: f64,
}

impl MetricSet {
    /// `None` when the inputs are empty or unpaired.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Option<Self> {
        Some(MetricSet {
            mae: MetricName::Mae.compute(y_true, y_pred)?,
            rmse: MetricName::Rmse.compute(y_true, y_pred)?,
            s_mae: MetricName::SMae.compute(y_true, y_pred)?,
            s_rmse: MetricName::SRmse.compute(y_true, y_pred)?,
        })
    }

    pub fn get(&self, name: MetricName) -> f64 {
        match name {
            MetricName::Mae => self.mae,
            MetricName::Rmse => self.rmse,
            MetricName::SMae => self.s_mae,
            MetricName::SRmse => self.s_rmse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScores {
    pub dimension: String,
    pub records: usize,
    pub truth_mean: f64,
    pub metrics: MetricSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<MetricSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub dimensions: Vec<DimensionScores>,
}

/// Score one dimension from paired value slices.
pub fn score_dimension(
    dimension: &str,
    y_true: &[f64],
    y_pred: &[f64],
    baseline: bool,
) -> Result<DimensionScores> {
    if y_true.len() != y_pred.len() {
        return Err(Error::LengthMismatch {
            left: y_true.len(),
            right: y_pred.len(),
        });
    }
    let empty = || Error::EmptyDataset {
        dimension: dimension.to_string(),
    };
    let metrics = MetricSet::compute(y_true, y_pred).ok_or_else(empty)?;
    let truth_mean = metrics::mean(y_true).ok_or_else(empty)?;
    let baseline = if baseline {
        let constant = vec![truth_mean; y_true.len()];
        MetricSet::compute(y_true, &constant)
    } else {
        None
    };

    Ok(DimensionScores {
        dimension: dimension.to_string(),
        records: y_true.len(),
        truth_mean,
        metrics,
        baseline,
    })
}

/// Evaluate every requested dimension.
pub fn evaluate(
    truth: &Dataset,
    pred: &Dataset,
    dimensions: &[Dimension],
    baseline: bool,
    ctx: &LogContext,
) -> Result<EvaluationReport> {
    if truth.len() != pred.len() {
        return Err(Error::LengthMismatch {
            left: truth.len(),
            right: pred.len(),
        });
    }

    let mut report = EvaluationReport::default();
    for dimension in dimensions {
        let name = dimension.as_str();
        let y_true = truth.softlabels_for(name)?;
        let y_pred = pred.softlabels_for(name)?;
        let scores = score_dimension(name, &y_true, &y_pred, baseline)?;

        let ctx = ctx.for_dimension(name);
        log_event!(
            ctx,
            INFO,
            event_names::EVALUATE_DONE,
            Stage::Evaluate,
            "dimension evaluated",
            records = scores.records as u64,
            mae = scores.metrics.mae,
            rmse = scores.metrics.rmse
        );
        report.dimensions.push(scores);
    }
    Ok(report)
}
