//! JSONL dataset loading and writing.

pub mod labeling;
pub mod record;

pub use labeling::{hard_label, label_records, LabelSummary};
pub use record::{AnnotatedRecord, ANNOTATION_FIELD, HARDLABELS_FIELD, SOFTLABELS_FIELD};

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use sl_common::{Error, Result, ANNOTATOR_COUNT};

/// Records of one dataset file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<AnnotatedRecord>,
}

impl Dataset {
    /// Read line-delimited JSON. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(AnnotatedRecord::parse(idx + 1, &line)?);
        }
        Ok(Dataset { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Label triples for one dimension, one per record.
    pub fn triples_for(&self, dimension: &str) -> Result<Vec<[String; ANNOTATOR_COUNT]>> {
        self.records.iter().map(|r| r.labels(dimension)).collect()
    }

    /// Soft labels for one dimension, one per record.
    pub fn softlabels_for(&self, dimension: &str) -> Result<Vec<f64>> {
        self.records.iter().map(|r| r.softlabel(dimension)).collect()
    }
}

/// Write records as JSONL.
///
/// An existing file is left alone unless `force` is set.
pub fn write_jsonl(path: &Path, records: &[AnnotatedRecord], force: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => Error::OutputExists {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })?;

    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{}", record.to_jsonl()?)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DATA: &str = concat!(
        r#"{"annotation":{"E/I":{"A1":"E+","A2":"E+","A3":"I-"}}}"#,
        "\n\n",
        r#"{"annotation":{"E/I":{"A1":"I+","A2":"I+","A3":"I+"}}}"#,
        "\n"
    );

    #[test]
    fn blank_lines_skipped_and_line_numbers_kept() {
        let ds = Dataset::from_reader(Cursor::new(DATA)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].line, 3);
        assert_eq!(
            ds.triples_for("E/I").unwrap(),
            vec![
                ["E+".to_string(), "E+".to_string(), "I-".to_string()],
                ["I+".to_string(), "I+".to_string(), "I+".to_string()],
            ]
        );
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = Dataset::from_reader(Cursor::new("{}\nnot json\n")).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn write_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let ds = Dataset::from_reader(Cursor::new(DATA)).unwrap();

        write_jsonl(&path, &ds.records, false).unwrap();
        let err = write_jsonl(&path, &ds.records, false).unwrap_err();
        assert!(matches!(err, Error::OutputExists { .. }));

        write_jsonl(&path, &ds.records[..1], true).unwrap();
        let reread = Dataset::load(&path).unwrap();
        assert_eq!(reread.len(), 1);
    }
}
