//! Settings file types.
//!
//! `settings.json` carries the EM knobs. Builtin defaults reproduce the
//! reference labeling run: tolerance 0.1 and at most 10000 iterations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Default convergence tolerance on the posterior max-change.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Complete settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub em: EmSettings,
}

/// How the initial emission table is assembled from the smoothed counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedEmission {
    /// Mix raw smoothed count rows weighted by the category shares.
    /// Rows are not unit-sum until the first M-step.
    #[default]
    SmoothedCounts,
    /// Normalize each smoothed count row before mixing.
    RowStochastic,
}

impl std::fmt::Display for SeedEmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedEmission::SmoothedCounts => write!(f, "smoothed_counts"),
            SeedEmission::RowStochastic => write!(f, "row_stochastic"),
        }
    }
}

/// EM loop parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmSettings {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default)]
    pub seed_emission: SeedEmission,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for EmSettings {
    fn default() -> Self {
        EmSettings {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed_emission: SeedEmission::default(),
        }
    }
}

impl EmSettings {
    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, tolerance: Option<f64>, max_iterations: Option<usize>) -> Self {
        if let Some(t) = tolerance {
            self.tolerance = t;
        }
        if let Some(n) = max_iterations {
            self.max_iterations = n;
        }
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            em: EmSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse settings from a JSON string.
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}
