//! Fuzz target for a full single-dimension fit.
//!
//! Any non-empty set of in-vocabulary triples must either fit with scores in
//! [0, 1] or report a degenerate posterior.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sl_common::{Category, Dimension, Error};
use sl_config::{EmSettings, SeedEmission};
use sl_core::inference::fit_dimension;
use sl_core::logging::LogContext;

#[derive(Debug, Arbitrary)]
struct Input {
    codes: Vec<[u8; 3]>,
    row_stochastic: bool,
    max_iterations: u8,
}

fuzz_target!(|input: Input| {
    if input.codes.is_empty() {
        return;
    }
    let spec = Dimension::SN.spec();
    let triples: Vec<[String; 3]> = input
        .codes
        .iter()
        .map(|c| {
            c.map(|b| {
                let category = Category::from_index(usize::from(b % 4)).expect("code in range");
                spec.decode(category).to_string()
            })
        })
        .collect();
    let settings = EmSettings {
        tolerance: 1e-6,
        max_iterations: usize::from(input.max_iterations.max(1)),
        seed_emission: if input.row_stochastic {
            SeedEmission::RowStochastic
        } else {
            SeedEmission::SmoothedCounts
        },
    };

    match fit_dimension(&spec, &triples, &settings, &LogContext::new("run-fuzz")) {
        Ok(fit) => {
            assert_eq!(fit.table.total_frequency(), triples.len());
            for entry in &fit.table.entries {
                assert!((0.0..=1.0).contains(&entry.score));
            }
        }
        Err(Error::DegeneratePosterior { .. }) => {}
        Err(e) => panic!("unexpected error: {e}"),
    }
});
