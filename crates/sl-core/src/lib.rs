//! Soft-label core library.
//!
//! This library provides the EM soft labeler and everything around it:
//! - EM inference per dimension (`inference`)
//! - Dataset loading and the soft/hard label join (`dataset`)
//! - Metric evaluation against reference labels (`evaluate`)
//! - Settings loading, logging, output rendering and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod dataset;
pub mod evaluate;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod output;
