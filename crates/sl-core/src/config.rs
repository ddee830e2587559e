//! Settings loading for the CLI.
//!
//! Wraps `sl_config` so callers see `sl_common::Error` and CLI overrides are
//! validated together with the file values.

use std::path::Path;

use sl_common::{Error, Result};
use sl_config::validate::validate_em;
use sl_config::{load_settings, EmSettings, LoadedSettings, ValidationError};

/// Command-line overrides for the EM block.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmOverrides {
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
}

/// Settings after resolution, validation and CLI overrides.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub loaded: LoadedSettings,
    pub em: EmSettings,
}

/// Convert a settings validation failure into the workspace error.
pub fn config_error(err: ValidationError) -> Error {
    Error::Config(format!("[{}] {}", err.code(), err))
}

/// Resolve settings and apply overrides.
pub fn load(cli_path: Option<&Path>, overrides: EmOverrides) -> Result<EffectiveSettings> {
    let mut loaded = load_settings(cli_path).map_err(config_error)?;
    let em = loaded
        .settings
        .em
        .with_overrides(overrides.tolerance, overrides.max_iterations);
    validate_em(&em).map_err(config_error)?;
    loaded.snapshot = loaded.snapshot.with_effective(em);
    Ok(EffectiveSettings { loaded, em })
}
