//! Join fitted scores back onto dataset records.
//!
//! `softlabels[dim]` is `1 - score`: a score near 1 means "pole A", and the
//! stored soft label measures the pull toward pole B. `hardlabels[dim]` is the
//! majority pole among the three annotators.

use serde::Serialize;
use serde_json::json;
use sl_common::{Category, DimensionSpec, Error, Pole, Result, ANNOTATOR_COUNT};

use super::record::{AnnotatedRecord, HARDLABELS_FIELD, SOFTLABELS_FIELD};
use crate::inference::aggregate::combination_string;
use crate::inference::{encode_items, DimensionFit, EncodedItem};

/// Per-dimension counts from a labeling pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionLabelCounts {
    pub dimension: String,
    pub records: usize,
    pub pole_a: usize,
    pub pole_b: usize,
    pub mean_softlabel: f64,
}

/// Summary of a labeling pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelSummary {
    pub dimensions: Vec<DimensionLabelCounts>,
}

/// Majority pole label: pole A when at least two annotators chose it.
pub fn hard_label<'a>(spec: &'a DimensionSpec, labels: &[Category; ANNOTATOR_COUNT]) -> &'a str {
    let item = EncodedItem::new(*labels);
    let pole = if item.pole_a_votes() >= 2 {
        Pole::A
    } else {
        Pole::B
    };
    spec.pole_label(pole)
}

/// Attach soft and hard labels for every fitted dimension.
///
/// Returns the augmented copies; the input records are not modified.
pub fn label_records(
    records: &[AnnotatedRecord],
    fits: &[DimensionFit],
) -> Result<(Vec<AnnotatedRecord>, LabelSummary)> {
    let mut out = records.to_vec();
    let mut summary = LabelSummary::default();

    for fit in fits {
        let spec = &fit.spec;
        let dimension = spec.name();
        let triples = records
            .iter()
            .map(|r| r.labels(dimension))
            .collect::<Result<Vec<_>>>()?;
        let items = encode_items(spec, &triples)?;

        let mut counts = DimensionLabelCounts {
            dimension: dimension.to_string(),
            records: items.len(),
            pole_a: 0,
            pole_b: 0,
            mean_softlabel: 0.0,
        };
        let mut soft_total = 0.0;

        for (record, item) in out.iter_mut().zip(&items) {
            let combination = combination_string(spec, item);
            let score = fit
                .table
                .score_of(&combination)
                .ok_or_else(|| Error::MissingCombination {
                    dimension: dimension.to_string(),
                    combination: combination.clone(),
                })?;
            let soft = 1.0 - score;
            let hard = hard_label(spec, &item.labels);
            if hard == spec.pole_label(Pole::A) {
                counts.pole_a += 1;
            } else {
                counts.pole_b += 1;
            }
            soft_total += soft;

            record.set_nested(SOFTLABELS_FIELD, dimension, json!(soft));
            record.set_nested(HARDLABELS_FIELD, dimension, json!(hard));
        }

        if !items.is_empty() {
            counts.mean_softlabel = soft_total / items.len() as f64;
        }
        summary.dimensions.push(counts);
    }

    Ok((out, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fit_dimension;
    use crate::logging::LogContext;
    use sl_common::Dimension;
    use sl_config::EmSettings;

    fn cats(codes: [usize; 3]) -> [Category; 3] {
        codes.map(|c| Category::from_index(c).unwrap())
    }

    #[test]
    fn hard_label_majority() {
        let spec = Dimension::EI.spec();
        assert_eq!(hard_label(&spec, &cats([0, 1, 3])), "E");
        assert_eq!(hard_label(&spec, &cats([0, 2, 3])), "I");
        assert_eq!(hard_label(&spec, &cats([3, 3, 3])), "I");
        let jp = Dimension::JP.spec();
        assert_eq!(hard_label(&jp, &cats([1, 1, 2])), "J");
    }

    fn record(line: usize, a: &str, b: &str, c: &str) -> AnnotatedRecord {
        AnnotatedRecord::parse(
            line,
            &format!(r#"{{"annotation":{{"E/I":{{"A1":"{a}","A2":"{b}","A3":"{c}"}}}}}}"#),
        )
        .unwrap()
    }

    #[test]
    fn soft_label_is_one_minus_score() {
        let records = vec![
            record(1, "E+", "E+", "E+"),
            record(2, "I+", "I+", "I+"),
            record(3, "E+", "E+", "E+"),
            record(4, "I+", "I+", "I+"),
        ];
        let spec = Dimension::EI.spec();
        let triples: Vec<_> = records.iter().map(|r| r.labels("E/I").unwrap()).collect();
        let fit = fit_dimension(&spec, &triples, &EmSettings::default(), &LogContext::new("run-t"))
            .unwrap();

        let (labeled, summary) = label_records(&records, std::slice::from_ref(&fit)).unwrap();
        assert_eq!(labeled[0].fields["softlabels"]["E/I"], 0.0);
        assert_eq!(labeled[0].fields["hardlabels"]["E/I"], "E");
        assert_eq!(labeled[1].fields["softlabels"]["E/I"], 1.0);
        assert_eq!(labeled[1].fields["hardlabels"]["E/I"], "I");
        assert_eq!(summary.dimensions[0].pole_a, 2);
        assert_eq!(summary.dimensions[0].pole_b, 2);
        assert_eq!(summary.dimensions[0].mean_softlabel, 0.5);
        assert!(records[0].fields.get("softlabels").is_none());
    }

    #[test]
    fn combination_missing_from_table_is_error() {
        let records = vec![record(1, "E+", "E-", "I+")];
        let spec = Dimension::EI.spec();
        let triples = vec![["E+", "E+", "E+"]];
        let fit = fit_dimension(&spec, &triples, &EmSettings::default(), &LogContext::new("run-t"))
            .unwrap();
        let err = label_records(&records, &[fit]).unwrap_err();
        assert!(
            matches!(err, Error::MissingCombination { ref combination, .. } if combination == "E+E-I+")
        );
    }
}
