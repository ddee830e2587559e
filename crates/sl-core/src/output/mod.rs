//! Report payloads and their stdout renderings.
//!
//! Every command builds a serializable report, then hands it to one of the
//! `write_*` functions with the selected `OutputFormat`. Renderers write to any
//! `io::Write` so they can be tested without a terminal.

pub mod markdown;

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sl_common::{OutputFormat, Result};
use sl_config::SettingsSnapshot;

use crate::dataset::LabelSummary;
use crate::evaluate::EvaluationReport;
use crate::inference::DimensionFit;

/// Version of the report payload layout.
pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// Result of `fit`: one table per dimension plus the settings used.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub settings: SettingsSnapshot,
    pub dimensions: Vec<DimensionFit>,
}

impl FitReport {
    pub fn new(run_id: impl Into<String>, settings: SettingsSnapshot, dimensions: Vec<DimensionFit>) -> Self {
        FitReport {
            schema_version: OUTPUT_SCHEMA_VERSION,
            run_id: run_id.into(),
            generated_at: Utc::now(),
            settings,
            dimensions,
        }
    }

    /// True when every dimension converged before the iteration cap.
    pub fn all_converged(&self) -> bool {
        self.dimensions.iter().all(|d| d.diagnostics.converged)
    }
}

/// Result of `label`.
#[derive(Debug, Clone, Serialize)]
pub struct LabelReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub records: usize,
    pub settings: SettingsSnapshot,
    pub summary: LabelSummary,
    pub converged: bool,
}

/// Result of `evaluate`, with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub truth: String,
    pub pred: String,
    #[serde(flatten)]
    pub report: EvaluationReport,
}

pub fn write_fit<W: Write>(w: &mut W, report: &FitReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(report)?)?,
        OutputFormat::Jsonl => {
            for fit in &report.dimensions {
                let line = serde_json::json!({
                    "run_id": report.run_id,
                    "dimension": fit.dimension(),
                    "table": fit.table,
                    "diagnostics": fit.diagnostics,
                });
                writeln!(w, "{}", serde_json::to_string(&line)?)?;
            }
        }
        OutputFormat::Md => markdown::write_fit(w, report)?,
        OutputFormat::Summary => {
            for fit in &report.dimensions {
                let d = &fit.diagnostics;
                writeln!(
                    w,
                    "[{}] {}: {} items, {} combinations, {} iterations ({}), PE={:.4}",
                    report.run_id,
                    fit.dimension(),
                    d.items,
                    d.distinct_combinations,
                    d.iterations,
                    if d.converged { "converged" } else { "cap reached" },
                    d.prior.pole_a,
                )?;
            }
        }
    }
    Ok(())
}

pub fn write_label<W: Write>(w: &mut W, report: &LabelReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(report)?)?,
        OutputFormat::Jsonl => writeln!(w, "{}", serde_json::to_string(report)?)?,
        OutputFormat::Md => markdown::write_label(w, report)?,
        OutputFormat::Summary => {
            writeln!(
                w,
                "[{}] label: {} records -> {}",
                report.run_id, report.records, report.output
            )?;
        }
    }
    Ok(())
}

pub fn write_evaluation<W: Write>(
    w: &mut W,
    report: &EvaluateReport,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(report)?)?,
        OutputFormat::Jsonl => {
            for scores in &report.report.dimensions {
                writeln!(w, "{}", serde_json::to_string(scores)?)?;
            }
        }
        OutputFormat::Md => markdown::write_evaluation(w, report)?,
        OutputFormat::Summary => {
            for s in &report.report.dimensions {
                writeln!(
                    w,
                    "[{}] {}: MAE={:.4} RMSE={:.4} S-MAE={:.4} S-RMSE={:.4}",
                    report.run_id,
                    s.dimension,
                    s.metrics.mae,
                    s.metrics.rmse,
                    s.metrics.s_mae,
                    s.metrics.s_rmse
                )?;
            }
        }
    }
    Ok(())
}
