//! Soft-label common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Personality dimensions and the four-symbol category codec
//! - Common error types with stable codes
//! - Output formats

pub mod categories;
pub mod error;
pub mod output;

pub use categories::{
    Category, Dimension, DimensionSpec, Pole, ANNOTATOR_COUNT, ANNOTATOR_KEYS, CATEGORY_COUNT,
};
pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
