//! Logging configuration.
//!
//! The level comes from `-q`/`-v`, else `SOFTLABEL_LOG`, else `RUST_LOG`.
//! The format is JSONL whenever the payload format is machine-readable,
//! else whatever `SOFTLABEL_LOG_FORMAT` names.

use std::fmt;

use tracing_subscriber::filter::LevelFilter;

const ENV_LOG_LEVEL: &str = "SOFTLABEL_LOG";
const ENV_LOG_FORMAT: &str = "SOFTLABEL_LOG_FORMAT";
const ENV_RUST_LOG: &str = "RUST_LOG";

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Jsonl,
}

impl LogFormat {
    fn named(value: &str) -> Option<Self> {
        match value.trim() {
            "human" => Some(LogFormat::Human),
            "jsonl" => Some(LogFormat::Jsonl),
            _ => None,
        }
    }
}

/// Verbosity, ordered quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level requested by `-q` / `-v`; `None` leaves the environment in charge.
    pub fn from_flags(quiet: bool, verbose: u8) -> Option<Self> {
        match (quiet, verbose) {
            (true, _) => Some(LogLevel::Error),
            (false, 0) => None,
            (false, 1) => Some(LogLevel::Debug),
            (false, _) => Some(LogLevel::Trace),
        }
    }

    /// Most verbose level named in a directive list such as
    /// `warn,sl_core=debug`.
    fn from_directives(value: &str) -> Option<Self> {
        value
            .split(',')
            .filter_map(|directive| directive.rsplit('=').next())
            .filter_map(|level| Self::named(level.trim()))
            .max()
    }

    fn named(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// ANSI colors in human output; still off when stderr is not a terminal.
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            color: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment, with CLI values taking precedence.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    fn resolve<F>(lookup: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = cli_level
            .or_else(|| lookup(ENV_LOG_LEVEL).and_then(|v| LogLevel::from_directives(&v)))
            .or_else(|| lookup(ENV_RUST_LOG).and_then(|v| LogLevel::from_directives(&v)))
            .unwrap_or_default();
        let format = cli_format
            .or_else(|| lookup(ENV_LOG_FORMAT).and_then(|v| LogFormat::named(&v)))
            .unwrap_or_default();
        LogConfig {
            format,
            level,
            color: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(LogLevel::from_flags(false, 0), None);
        assert_eq!(LogLevel::from_flags(false, 1), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_flags(false, 3), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_flags(true, 2), Some(LogLevel::Error));
    }

    #[test]
    fn directive_lists_pick_most_verbose() {
        assert_eq!(LogLevel::from_directives("warn"), Some(LogLevel::Warn));
        assert_eq!(
            LogLevel::from_directives("warn,sl_core=debug"),
            Some(LogLevel::Debug)
        );
        assert_eq!(LogLevel::from_directives("sl_core"), None);
    }

    #[test]
    fn softlabel_log_beats_rust_log() {
        let config = LogConfig::resolve(
            env(&[(ENV_LOG_LEVEL, "warn"), (ENV_RUST_LOG, "trace")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Warn);

        let config = LogConfig::resolve(env(&[(ENV_RUST_LOG, "debug")]), None, None);
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn cli_values_win() {
        let lookup = env(&[(ENV_LOG_LEVEL, "trace"), (ENV_LOG_FORMAT, "human")]);
        let config = LogConfig::resolve(lookup, Some(LogLevel::Error), Some(LogFormat::Jsonl));
        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn unknown_env_values_fall_back_to_defaults() {
        let lookup = env(&[(ENV_LOG_LEVEL, "loud"), (ENV_LOG_FORMAT, "xml")]);
        let config = LogConfig::resolve(lookup, None, None);
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Human);
        assert!(config.color);
    }
}
