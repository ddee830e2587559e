//! Load → fit → label → write → evaluate, through the library API.

use std::io::Cursor;

use sl_common::{Dimension, Error};
use sl_config::EmSettings;
use sl_core::dataset::{label_records, write_jsonl, Dataset};
use sl_core::evaluate::evaluate;
use sl_core::inference::fit_dimension;
use sl_core::logging::LogContext;

fn line(id: usize, ei: [&str; 3], sn: [&str; 3]) -> String {
    format!(
        r#"{{"id":{id},"text":"post {id}","annotation":{{"E/I":{{"A1":"{}","A2":"{}","A3":"{}"}},"S/N":{{"A1":"{}","A2":"{}","A3":"{}"}}}}}}"#,
        ei[0], ei[1], ei[2], sn[0], sn[1], sn[2]
    )
}

fn dataset() -> Dataset {
    let rows = [
        (["E+", "E+", "E+"], ["S+", "S-", "N-"]),
        (["E+", "E-", "I-"], ["N+", "N+", "N+"]),
        (["I+", "I+", "I-"], ["S+", "S+", "S-"]),
        (["E-", "E-", "E+"], ["N-", "S-", "N+"]),
        (["I+", "I+", "I+"], ["S-", "S-", "S-"]),
        (["E+", "E+", "E+"], ["N+", "N-", "N-"]),
    ];
    let text: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, (ei, sn))| line(i + 1, *ei, *sn))
        .collect();
    Dataset::from_reader(Cursor::new(text.join("\n"))).unwrap()
}

fn fits(ds: &Dataset, dims: &[Dimension]) -> Vec<sl_core::inference::DimensionFit> {
    let ctx = LogContext::new("run-pipeline");
    dims.iter()
        .map(|d| {
            let triples = ds.triples_for(d.as_str()).unwrap();
            fit_dimension(&d.spec(), &triples, &EmSettings::default(), &ctx).unwrap()
        })
        .collect()
}

#[test]
fn labels_round_trip_through_disk() {
    let ds = dataset();
    let dims = [Dimension::EI, Dimension::SN];
    let fits = fits(&ds, &dims);
    let (labeled, summary) = label_records(&ds.records, &fits).unwrap();

    assert_eq!(summary.dimensions.len(), 2);
    for counts in &summary.dimensions {
        assert_eq!(counts.pole_a + counts.pole_b, ds.len());
        assert!((0.0..=1.0).contains(&counts.mean_softlabel));
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labeled.jsonl");
    write_jsonl(&path, &labeled, false).unwrap();
    let reread = Dataset::load(&path).unwrap();
    assert_eq!(reread.len(), ds.len());

    // Original fields survive untouched.
    assert_eq!(reread.records[0].fields["id"], 1);
    assert_eq!(reread.records[0].fields["text"], "post 1");
    assert_eq!(reread.records[0].fields["hardlabels"]["E/I"], "E");
    assert_eq!(reread.records[4].fields["hardlabels"]["E/I"], "I");
    assert_eq!(reread.records[2].fields["hardlabels"]["S/N"], "S");

    // Records sharing a combination share a soft label.
    let soft = reread.softlabels_for("E/I").unwrap();
    assert_eq!(soft[0], soft[5]);
    let ei_fit = &fits[0];
    let score = ei_fit.table.score_of("E+E+E+").unwrap();
    assert_eq!(soft[0], 1.0 - score);

    // A labeled file evaluated against itself is a perfect match.
    let report = evaluate(&reread, &reread, &dims, true, &LogContext::new("run-pipeline")).unwrap();
    for scores in &report.dimensions {
        assert_eq!(scores.metrics.mae, 0.0);
        assert!(scores.baseline.is_some());
    }
}

#[test]
fn missing_dimension_in_record_is_reported() {
    let ds = dataset();
    let err = ds.triples_for("T/F").unwrap_err();
    assert!(matches!(
        err,
        Error::MissingAnnotation { line: 1, ref dimension, .. } if dimension == "T/F"
    ));
}

#[test]
fn fit_on_one_dataset_labels_another_only_if_combinations_match() {
    let ds = dataset();
    let fit = fits(&ds, &[Dimension::EI]);
    let other = Dataset::from_reader(Cursor::new(line(1, ["I-", "E-", "E-"], ["S+", "S+", "S+"]))).unwrap();
    let err = label_records(&other.records, &fit).unwrap_err();
    assert!(matches!(err, Error::MissingCombination { .. }));
}
