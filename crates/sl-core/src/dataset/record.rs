//! One annotated dataset record.

use serde_json::{Map, Value};
use sl_common::{Error, Result, ANNOTATOR_COUNT, ANNOTATOR_KEYS};

/// Field holding the per-dimension annotator labels.
pub const ANNOTATION_FIELD: &str = "annotation";
/// Field the labeling step writes soft labels into.
pub const SOFTLABELS_FIELD: &str = "softlabels";
/// Field the labeling step writes hard labels into.
pub const HARDLABELS_FIELD: &str = "hardlabels";

/// A JSON object from the dataset, with its 1-based line number.
///
/// Unknown fields are kept as-is and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    pub line: usize,
    pub fields: Map<String, Value>,
}

impl AnnotatedRecord {
    /// Parse one JSONL line.
    pub fn parse(line: usize, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::MalformedRecord {
            line,
            message: e.to_string(),
        })?;
        match value {
            Value::Object(fields) => Ok(AnnotatedRecord { line, fields }),
            other => Err(Error::MalformedRecord {
                line,
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// The three annotator labels for a dimension, in A1, A2, A3 order.
    pub fn labels(&self, dimension: &str) -> Result<[String; ANNOTATOR_COUNT]> {
        let per_dim = self
            .fields
            .get(ANNOTATION_FIELD)
            .and_then(|a| a.get(dimension))
            .and_then(Value::as_object);

        let mut out: [String; ANNOTATOR_COUNT] = Default::default();
        for (slot, key) in out.iter_mut().zip(ANNOTATOR_KEYS) {
            let value = per_dim.and_then(|m| m.get(key)).ok_or_else(|| Error::MissingAnnotation {
                line: self.line,
                dimension: dimension.to_string(),
                annotator: key.to_string(),
            })?;
            *slot = value
                .as_str()
                .ok_or_else(|| Error::MalformedRecord {
                    line: self.line,
                    message: format!(
                        "annotation {dimension}/{key} must be a string, found {}",
                        json_kind(value)
                    ),
                })?
                .to_string();
        }
        Ok(out)
    }

    /// A numeric soft label written by an earlier labeling run.
    pub fn softlabel(&self, dimension: &str) -> Result<f64> {
        self.fields
            .get(SOFTLABELS_FIELD)
            .and_then(|s| s.get(dimension))
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::MalformedRecord {
                line: self.line,
                message: format!("missing numeric {SOFTLABELS_FIELD}[{dimension:?}]"),
            })
    }

    /// Insert `value` under `field[dimension]`, creating the map if needed.
    pub fn set_nested(&mut self, field: &str, dimension: &str, value: Value) {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = slot {
            map.insert(dimension.to_string(), value);
        }
    }

    /// Serialize back to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
