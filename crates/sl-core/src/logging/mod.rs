//! Structured logging for sl-core.
//!
//! Two output modes on stderr:
//! - Human-readable console lines for interactive use
//! - JSONL for pipelines that parse the stdout payload
//!
//! # Usage
//!
//! ```ignore
//! use sl_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id());
//! log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "fit started");
//! ```
//!
//! stdout is reserved for command payloads.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Call once at startup. A second call is a no-op, which keeps tests that
/// share a process from panicking.
pub fn init_logging(config: &LogConfig) {
    // Event targets are event names, not module paths, so the filter is a
    // global level rather than a per-crate directive.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .parse_lossy(config.level.as_str());

    let _ = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(config.color && std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Emit a structured event with the context's correlation fields.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::SEED_READY, Stage::Seed, "seed built");
/// log_event!(ctx, DEBUG, event_names::EM_ITERATION, Stage::Iterate, "step",
///     iteration = 3, max_diff = 0.02);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            dimension = $ctx.dimension_field(),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            dimension = $ctx.dimension_field(),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            dimension = $ctx.dimension_field(),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            dimension = $ctx.dimension_field(),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}
