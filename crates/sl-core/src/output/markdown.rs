//! Markdown renderings.

use std::io::{self, Write};

use super::{EvaluateReport, FitReport, LabelReport};
use crate::inference::{DimensionFit, MID_LABEL};

pub fn write_fit<W: Write>(w: &mut W, report: &FitReport) -> io::Result<()> {
    writeln!(w, "# Soft-label fit")?;
    writeln!(w)?;
    writeln!(w, "Run: `{}`", report.run_id)?;
    let s = &report.settings;
    writeln!(
        w,
        "Settings: {} ({}), tolerance {}, max iterations {}, seed {}",
        s.source,
        s.short_id(),
        s.effective.tolerance,
        s.effective.max_iterations,
        s.effective.seed_emission
    )?;
    for fit in &report.dimensions {
        writeln!(w)?;
        write_dimension(w, fit)?;
    }
    Ok(())
}

fn write_dimension<W: Write>(w: &mut W, fit: &DimensionFit) -> io::Result<()> {
    let d = &fit.diagnostics;
    writeln!(w, "## {}", fit.dimension())?;
    writeln!(w)?;
    writeln!(w, "| combination | posterior | frequency | score |")?;
    writeln!(w, "|---|---:|---:|---:|")?;
    for (idx, entry) in fit.table.entries.iter().enumerate() {
        if idx == fit.table.mid_index {
            write_mid_row(w)?;
        }
        writeln!(
            w,
            "| {} | {:.6} | {} | {:.6} |",
            entry.combination, entry.posterior, entry.frequency, entry.score
        )?;
    }
    if fit.table.mid_index >= fit.table.len() {
        write_mid_row(w)?;
    }
    writeln!(w)?;
    writeln!(
        w,
        "- items: {}, combinations: {}",
        d.items, d.distinct_combinations
    )?;
    writeln!(
        w,
        "- iterations: {} ({} M-steps), {}",
        d.iterations,
        d.m_steps,
        if d.converged {
            "converged"
        } else {
            "stopped at iteration cap"
        }
    )?;
    writeln!(w, "- final max diff: {:.6}", d.final_max_diff)?;
    writeln!(
        w,
        "- prior: PE={:.6} PI={:.6} (seed PE={:.6})",
        d.prior.pole_a, d.prior.pole_b, d.seed_prior.pole_a
    )
}

fn write_mid_row<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "| *{MID_LABEL}* | 0.500000 | 0 | 0.500000 |")
}

pub fn write_label<W: Write>(w: &mut W, report: &LabelReport) -> io::Result<()> {
    writeln!(w, "# Soft-label labeling")?;
    writeln!(w)?;
    writeln!(w, "Input: `{}`", report.input)?;
    writeln!(w, "Output: `{}` ({} records)", report.output, report.records)?;
    if !report.converged {
        writeln!(w)?;
        writeln!(w, "**Warning:** at least one dimension hit the iteration cap.")?;
    }
    writeln!(w)?;
    writeln!(w, "| dimension | pole A | pole B | mean soft label |")?;
    writeln!(w, "|---|---:|---:|---:|")?;
    for d in &report.summary.dimensions {
        writeln!(
            w,
            "| {} | {} | {} | {:.4} |",
            d.dimension, d.pole_a, d.pole_b, d.mean_softlabel
        )?;
    }
    Ok(())
}

pub fn write_evaluation<W: Write>(w: &mut W, report: &EvaluateReport) -> io::Result<()> {
    writeln!(w, "# Soft-label evaluation")?;
    writeln!(w)?;
    writeln!(w, "Truth: `{}`, predictions: `{}`", report.truth, report.pred)?;
    writeln!(w)?;
    writeln!(w, "| dimension | n | MAE | RMSE | S-MAE | S-RMSE |")?;
    writeln!(w, "|---|---:|---:|---:|---:|---:|")?;
    for s in &report.report.dimensions {
        let m = &s.metrics;
        writeln!(
            w,
            "| {} | {} | {:.4} | {:.4} | {:.4} | {:.4} |",
            s.dimension, s.records, m.mae, m.rmse, m.s_mae, m.s_rmse
        )?;
        if let Some(b) = &s.baseline {
            writeln!(
                w,
                "| {} (mean baseline) | {} | {:.4} | {:.4} | {:.4} | {:.4} |",
                s.dimension, s.records, b.mae, b.rmse, b.s_mae, b.s_rmse
            )?;
        }
    }
    Ok(())
}
