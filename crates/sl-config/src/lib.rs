//! Soft-labeler configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for settings.json
//! - Settings resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Settings snapshots embedded in fit output

pub mod resolve;
pub mod settings;
pub mod snapshot;
pub mod validate;

pub use resolve::{resolve_settings, SettingsPath};
pub use settings::{EmSettings, SeedEmission, Settings};
pub use snapshot::SettingsSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

use std::path::Path;

/// Settings loaded through the resolution chain, with their snapshot.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub resolved: SettingsPath,
    pub snapshot: SettingsSnapshot,
}

/// Resolve, read and validate settings.
///
/// Falls back to builtin defaults when no file is found. A file that exists
/// but fails to parse or validate is an error, never silently replaced.
pub fn load_settings(cli_path: Option<&Path>) -> ValidationResult<LoadedSettings> {
    let resolved = resolve_settings(cli_path);
    let (settings, raw) = match &resolved.path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            (Settings::from_json(&raw)?, Some(raw))
        }
        None => (Settings::default(), None),
    };
    validate::validate_settings(&settings)?;
    let snapshot = SettingsSnapshot::new(&resolved, raw.as_deref(), settings.em);
    Ok(LoadedSettings {
        settings,
        resolved,
        snapshot,
    })
}
