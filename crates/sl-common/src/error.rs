//! Error types for the soft-label workspace.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Unknown Category Label
//!   Reason: unknown category "E*" for dimension E/I
//!   Fix: Every annotation must be one of the four tokens of its dimension ...
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "input",
//!   "message": "unknown category \"E*\" for dimension E/I",
//!   "recoverable": true,
//!   "context": { "dimension": "E/I", "label": "E*" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for soft-label operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Settings file and vocabulary configuration errors.
    Config,
    /// Dataset contract violations (labels, missing fields, empty sets).
    Input,
    /// EM estimation and numerical errors.
    Inference,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the soft-label workspace.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid vocabulary for dimension {dimension}: {message}")]
    InvalidVocabulary { dimension: String, message: String },

    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    // Input errors (20-29)
    #[error("unknown category {label:?} for dimension {dimension}")]
    UnknownCategory { dimension: String, label: String },

    #[error("record {line}: missing annotation {annotator} for dimension {dimension}")]
    MissingAnnotation {
        line: usize,
        dimension: String,
        annotator: String,
    },

    #[error("no annotated items for dimension {dimension}")]
    EmptyDataset { dimension: String },

    #[error("record {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("length mismatch: {left} truth records vs {right} predictions")]
    LengthMismatch { left: usize, right: usize },

    // Inference errors (30-39)
    #[error("degenerate posterior for combination {combination}: zero total likelihood")]
    DegeneratePosterior { combination: String },

    #[error("combination {combination} missing from result table for dimension {dimension}")]
    MissingCombination {
        dimension: String,
        combination: String,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("refusing to overwrite existing file {path}")]
    OutputExists { path: String },
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Inference errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidVocabulary { .. } => 11,
            Error::UnknownDimension(_) => 12,
            Error::UnknownCategory { .. } => 20,
            Error::MissingAnnotation { .. } => 21,
            Error::EmptyDataset { .. } => 22,
            Error::MalformedRecord { .. } => 23,
            Error::LengthMismatch { .. } => 24,
            Error::DegeneratePosterior { .. } => 30,
            Error::MissingCombination { .. } => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::OutputExists { .. } => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidVocabulary { .. } | Error::UnknownDimension(_) => {
                ErrorCategory::Config
            }

            Error::UnknownCategory { .. }
            | Error::MissingAnnotation { .. }
            | Error::EmptyDataset { .. }
            | Error::MalformedRecord { .. }
            | Error::LengthMismatch { .. } => ErrorCategory::Input,

            Error::DegeneratePosterior { .. } | Error::MissingCombination { .. } => {
                ErrorCategory::Inference
            }

            Error::Io(_) | Error::Json(_) | Error::OutputExists { .. } => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by fixing inputs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidVocabulary { .. } => true,
            Error::UnknownDimension(_) => true,

            // Input: fix the dataset and rerun
            Error::UnknownCategory { .. } => true,
            Error::MissingAnnotation { .. } => true,
            Error::EmptyDataset { .. } => true,
            Error::MalformedRecord { .. } => true,
            Error::LengthMismatch { .. } => true,

            // The fitted model itself is unusable for this input
            Error::DegeneratePosterior { .. } => false,
            Error::MissingCombination { .. } => false,

            Error::Io(_) => true,
            Error::Json(_) => true,
            Error::OutputExists { .. } => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'sl-core config validate' to check the settings file, or remove it to use builtin defaults."
            }
            Error::InvalidVocabulary { .. } => {
                "List the vocabulary as strong-A, weak-A, weak-B, strong-B (e.g. E+, E-, I-, I+)."
            }
            Error::UnknownDimension(_) => "Use one of E/I, S/N, T/F, J/P.",
            Error::UnknownCategory { .. } => {
                "Every annotation must be one of the four tokens of its dimension. Fix the record and rerun."
            }
            Error::MissingAnnotation { .. } => {
                "Each record needs annotation.<dimension>.A1, A2 and A3. Fix or drop the record."
            }
            Error::EmptyDataset { .. } => "Provide at least one annotated record.",
            Error::MalformedRecord { .. } => {
                "Each non-blank line must be a JSON object. Check syntax with 'jq -c . <file>'."
            }
            Error::LengthMismatch { .. } => {
                "Truth and prediction files must list the same records in the same order."
            }
            Error::DegeneratePosterior { .. } => {
                "The converged model assigns zero likelihood to this combination. Try a smaller tolerance or report the dataset."
            }
            Error::MissingCombination { .. } => {
                "Labels must be produced from the same dataset the model was fitted on."
            }
            Error::Io(_) => "Check that the path exists and is readable/writable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
            Error::OutputExists { .. } => "Choose another output path or pass --force.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidVocabulary { .. } => "Invalid Vocabulary",
            Error::UnknownDimension(_) => "Unknown Dimension",
            Error::UnknownCategory { .. } => "Unknown Category Label",
            Error::MissingAnnotation { .. } => "Missing Annotation",
            Error::EmptyDataset { .. } => "Empty Dataset",
            Error::MalformedRecord { .. } => "Malformed Record",
            Error::LengthMismatch { .. } => "Length Mismatch",
            Error::DegeneratePosterior { .. } => "Degenerate Posterior",
            Error::MissingCombination { .. } => "Missing Combination",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
            Error::OutputExists { .. } => "Output Exists",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., dimension, label).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownCategory { dimension, label } => {
                context.insert("dimension".to_string(), serde_json::json!(dimension));
                context.insert("label".to_string(), serde_json::json!(label));
            }
            Error::MissingAnnotation {
                line,
                dimension,
                annotator,
            } => {
                context.insert("line".to_string(), serde_json::json!(line));
                context.insert("dimension".to_string(), serde_json::json!(dimension));
                context.insert("annotator".to_string(), serde_json::json!(annotator));
            }
            Error::EmptyDataset { dimension } => {
                context.insert("dimension".to_string(), serde_json::json!(dimension));
            }
            Error::MalformedRecord { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::DegeneratePosterior { combination } => {
                context.insert("combination".to_string(), serde_json::json!(combination));
            }
            Error::OutputExists { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
