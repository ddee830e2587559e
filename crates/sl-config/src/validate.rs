//! Settings validation errors and semantic validation.

use thiserror::Error;

use crate::settings::{EmSettings, Settings};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Settings validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a settings file semantically.
pub fn validate_settings(settings: &Settings) -> ValidationResult<()> {
    if settings.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: settings.schema_version.clone(),
        });
    }
    validate_em(&settings.em)
}

/// Validate EM parameters, including values that came from CLI overrides.
pub fn validate_em(em: &EmSettings) -> ValidationResult<()> {
    if !em.tolerance.is_finite() || em.tolerance <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "em.tolerance".to_string(),
            message: format!("Must be finite and positive, got {}", em.tolerance),
        });
    }

    if em.max_iterations == 0 {
        return Err(ValidationError::InvalidValue {
            field: "em.max_iterations".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass() {
        validate_settings(&Settings::default()).unwrap();
    }

    #[test]
    fn rejects_version_mismatch() {
        let mut s = Settings::default();
        s.schema_version = "0.9.0".to_string();
        let err = validate_settings(&s).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn rejects_bad_tolerance() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let em = EmSettings {
                tolerance: bad,
                ..EmSettings::default()
            };
            assert!(matches!(
                validate_em(&em),
                Err(ValidationError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn rejects_zero_iterations() {
        let em = EmSettings {
            max_iterations: 0,
            ..EmSettings::default()
        };
        let err = validate_em(&em).unwrap_err();
        assert!(err.to_string().contains("em.max_iterations"));
    }
}
