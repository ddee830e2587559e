//! Settings resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path →
//! system path → builtin defaults.

use std::path::{Path, PathBuf};

/// Discovered settings file path.
#[derive(Debug, Clone, Default)]
pub struct SettingsPath {
    /// Path to settings.json (or None when falling back to builtins).
    pub path: Option<PathBuf>,

    /// Where the file was found.
    pub source: ConfigSource,
}

/// Where a settings file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--settings`.
    CliArgument,

    /// Set via `SOFTLABEL_SETTINGS` or `SOFTLABEL_CONFIG_DIR`.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Found in /etc/softlabel/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

const ENV_SETTINGS_PATH: &str = "SOFTLABEL_SETTINGS";
const ENV_CONFIG_DIR: &str = "SOFTLABEL_CONFIG_DIR";

const SETTINGS_FILENAME: &str = "settings.json";

/// Application name for XDG and system directories.
const APP_NAME: &str = "softlabel";

/// Resolve the settings path.
///
/// A CLI path is returned as-is even when it does not exist, so the loader
/// reports the missing file instead of silently using defaults. Every other
/// candidate is only taken when the file exists.
pub fn resolve_settings(cli_path: Option<&Path>) -> SettingsPath {
    if let Some(path) = cli_path {
        return SettingsPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_SETTINGS_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(SETTINGS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(SETTINGS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    let system_path = system_config_dir().join(SETTINGS_FILENAME);
    if system_path.exists() {
        return found(system_path, ConfigSource::SystemConfig);
    }

    SettingsPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> SettingsPath {
    SettingsPath {
        path: Some(path),
        source,
    }
}

/// XDG config directory for the soft-labeler.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// System config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::CliArgument.to_string(), "CLI argument");
        assert_eq!(ConfigSource::Environment.to_string(), "environment variable");
        assert_eq!(ConfigSource::BuiltinDefault.to_string(), "builtin default");
    }

    #[test]
    fn test_cli_path_kept_even_if_missing() {
        let p = Path::new("/nonexistent/softlabel/settings.json");
        let resolved = resolve_settings(Some(p));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(p));
    }

    #[test]
    fn test_system_dir_name() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/softlabel"));
    }
}
