//! Soft-label math utilities.

pub mod math;

pub use math::metrics;
pub use math::metrics::MetricName;
pub use math::stable::*;
