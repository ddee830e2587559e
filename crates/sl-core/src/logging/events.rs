//! Structured event vocabulary for logging.
//!
//! Every event carries the run ID and a pipeline stage; events raised while
//! fitting also carry the dimension.

use serde::{Deserialize, Serialize};

/// Log levels as they appear in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and settings.
    Init,
    /// Reading the dataset.
    Load,
    /// Building the seed confusion matrix.
    Seed,
    /// EM iterations.
    Iterate,
    /// Final pass, dedupe and calibration.
    Aggregate,
    /// Joining scores back onto records.
    Label,
    /// Metric computation.
    Evaluate,
    /// Writing output files.
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Seed => "seed",
            Stage::Iterate => "iterate",
            Stage::Aggregate => "aggregate",
            Stage::Label => "label",
            Stage::Evaluate => "evaluate",
            Stage::Write => "write",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names, used as tracing targets.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    pub const DATASET_LOADED: &str = "dataset.loaded";

    pub const SEED_READY: &str = "seed.ready";

    pub const EM_ITERATION: &str = "em.iteration";
    pub const EM_CONVERGED: &str = "em.converged";
    pub const EM_EXHAUSTED: &str = "em.exhausted";

    pub const AGGREGATE_DONE: &str = "aggregate.done";

    pub const LABEL_DONE: &str = "label.done";

    pub const EVALUATE_DONE: &str = "evaluate.done";

    pub const OUTPUT_WRITTEN: &str = "output.written";

    pub const RUN_FAILED: &str = "run.failed";
}

/// Correlation data attached to every event.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Dimension being processed, once known.
    pub dimension: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            dimension: None,
        }
    }

    /// A copy of this context scoped to one dimension.
    pub fn for_dimension(&self, dimension: impl Into<String>) -> Self {
        LogContext {
            run_id: self.run_id.clone(),
            dimension: Some(dimension.into()),
        }
    }

    /// Dimension name for log fields, `-` when unscoped.
    pub fn dimension_field(&self) -> &str {
        self.dimension.as_deref().unwrap_or("-")
    }
}
