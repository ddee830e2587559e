//! Settings snapshots for reproducibility.
//!
//! A snapshot records which settings a fit actually ran with, so a table of
//! soft labels can be traced back to its configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::SettingsPath;
use crate::settings::EmSettings;

/// A frozen snapshot of the effective settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Where the settings came from.
    pub source: String,

    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the settings file content, if a file was read.
    #[serde(default)]
    pub content_hash: Option<String>,

    /// Values after CLI overrides.
    pub effective: EmSettings,
}

impl SettingsSnapshot {
    pub fn new(resolved: &SettingsPath, raw: Option<&str>, effective: EmSettings) -> Self {
        SettingsSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            source: resolved.source.to_string(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            content_hash: raw.map(hash_content),
            effective,
        }
    }

    /// Replace the effective values, e.g. after applying CLI overrides.
    pub fn with_effective(mut self, effective: EmSettings) -> Self {
        self.effective = effective;
        self
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Whether two snapshots were taken from the same file content.
    pub fn same_content(&self, other: &SettingsSnapshot) -> bool {
        self.content_hash == other.content_hash
    }

    /// First 12 hex chars of the content hash, or "builtin".
    pub fn short_id(&self) -> &str {
        match &self.content_hash {
            Some(h) => &h[..12.min(h.len())],
            None => "builtin",
        }
    }
}

/// Hex SHA-256 of a string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
