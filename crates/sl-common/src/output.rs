//! Output formats for CLI payloads.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON document (default for machine consumption)
    #[default]
    Json,

    /// One JSON object per line, one line per dimension
    Jsonl,

    /// Human-readable Markdown tables
    Md,

    /// One-line summary per dimension
    Summary,
}

impl OutputFormat {
    /// Machine-readable formats also switch stderr logging to JSONL.
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Jsonl)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_value_names() {
        for format in OutputFormat::value_variants() {
            let parsed = OutputFormat::from_str(&format.to_string(), true).unwrap();
            assert_eq!(&parsed, format);
        }
    }

    #[test]
    fn machine_formats() {
        assert!(OutputFormat::Json.is_machine());
        assert!(OutputFormat::Jsonl.is_machine());
        assert!(!OutputFormat::Md.is_machine());
        assert!(!OutputFormat::Summary.is_machine());
    }
}
