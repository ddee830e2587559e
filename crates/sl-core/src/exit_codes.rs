//! Exit codes for the sl-core CLI.
//!
//! Exit code ranges:
//! - 0-1: Success/operational outcomes
//! - 10-19: User/input errors (recoverable by user action)
//! - 20-29: Internal and I/O errors

use sl_common::{Error, ErrorCategory};

/// Exit codes for sl-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Success / Operational Outcomes (0-1)
    // ========================================================================
    /// Success
    Clean = 0,

    /// Finished, but at least one dimension hit the iteration cap
    NotConverged = 1,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Settings file invalid or unreadable
    ConfigError = 11,

    /// Dataset content invalid
    InputError = 12,

    /// Output file exists and --force was not given
    OutputExists = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NotConverged)
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NotConverged => "OK_NOT_CONVERGED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::OutputExists => "ERR_OUTPUT_EXISTS",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Map a library error to the exit code the CLI reports for it.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::OutputExists { .. } => ExitCode::OutputExists,
            Error::UnknownDimension(_) => ExitCode::ArgsError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Input => ExitCode::InputError,
                ErrorCategory::Inference => ExitCode::InternalError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::NotConverged.is_success());
        assert!(ExitCode::InputError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::ConfigError.is_internal_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::OutputExists.to_string(), "ERR_OUTPUT_EXISTS (13)");
    }

    #[test]
    fn test_error_mapping() {
        let err = Error::UnknownCategory {
            dimension: "E/I".to_string(),
            label: "X+".to_string(),
        };
        assert_eq!(ExitCode::for_error(&err), ExitCode::InputError);
        assert_eq!(
            ExitCode::for_error(&Error::Config("bad".to_string())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::for_error(&Error::OutputExists {
                path: "x".to_string()
            }),
            ExitCode::OutputExists
        );
        assert_eq!(
            ExitCode::for_error(&Error::DegeneratePosterior {
                combination: "E+E+E+".to_string()
            }),
            ExitCode::InternalError
        );
    }
}
