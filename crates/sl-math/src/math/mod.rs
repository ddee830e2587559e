//! Core math modules.

pub mod metrics;
pub mod stable;
