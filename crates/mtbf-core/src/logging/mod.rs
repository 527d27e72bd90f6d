//! Structured logging for the engine and CLI.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - JSON lines for pipelines
//!
//! # Usage
//!
//! ```ignore
//! use mtbf_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(mtbf_common::RunId::new().0);
//! mtbf_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting");
//! ```
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, LogContext, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_new(config.directives())
        .unwrap_or_else(|_| EnvFilter::new(format!("mtbf_core={0},mtbf={0}", config.level)))
}

/// Initialize the logging subsystem.
///
/// Call once at startup. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = filter(config);
    match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init();
            } else {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init();
        }
    }
}

/// Emit a tracing event tagged with the context's run id and a stage.
///
/// Usage:
/// ```ignore
/// log_event!(ctx, INFO, event_names::FIT_FINISHED, Stage::Fit, "fit converged",
///     method = %report.method, iterations = report.iterations);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        tracing::info!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($($fields)+ ,)?
            "{}", $msg
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        tracing::debug!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($($fields)+ ,)?
            "{}", $msg
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        tracing::warn!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($($fields)+ ,)?
            "{}", $msg
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        tracing::error!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($($fields)+ ,)?
            "{}", $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directives_fall_back() {
        let mut config = LogConfig::default();
        config.env_directives = Some("=[not a filter".to_string());
        // must not panic
        let _ = filter(&config);
    }

    #[test]
    fn test_log_event_macro_compiles_without_subscriber() {
        let ctx = LogContext::new("run-test");
        crate::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting", repeats = 3);
        crate::log_event!(ctx, WARN, event_names::COST_OPTIMIZED, Stage::Cost, "slow");
        crate::log_event!(ctx, DEBUG, event_names::SPRT_DECIDED, Stage::Sequential, "decided",
            state = %"accepted", index = ?Some(5));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LogConfig::default().with_level(LogLevel::Off));
        init_logging(&LogConfig::default().with_format(LogFormat::Jsonl));
    }
}
