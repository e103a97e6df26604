use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::config_directory;
use crate::context::InvocationContext;

const LOG_FILE_NAME: &str = "runway.log";
const LOG_FILTER_VAR: &str = "RUNWAY_LOG";

/// Controls where structured logs are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingDestination {
    /// Emit logs to both the persistent file and stderr.
    FileAndStderr,
    /// Emit logs only to the persistent file; the terminal shows `ui` output only.
    FileOnly,
    /// Emit logs only to stderr (tests or ad-hoc runs).
    StderrOnly,
}

#[derive(Debug)]
struct LoggingGuards {
    _guard: Option<WorkerGuard>,
    log_path: Option<PathBuf>,
}

static LOGGING_STATE: OnceLock<LoggingGuards> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global structured logging subscriber.
///
/// The first call wins; subsequent calls are no-ops that return the resolved log file path.
pub fn init_logging(
    destination: LoggingDestination,
    ctx: &InvocationContext,
) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let guards = install_logging(destination, ctx)?;
        if let Err(guards) = LOGGING_STATE.set(guards) {
            drop(guards);
        }
    }

    Ok(current_log_path())
}

/// Returns the log file path selected during logging initialization (if any).
pub fn current_log_path() -> Option<&'static PathBuf> {
    LOGGING_STATE
        .get()
        .and_then(|guards| guards.log_path.as_ref())
}

fn install_logging(
    destination: LoggingDestination,
    ctx: &InvocationContext,
) -> Result<LoggingGuards, LoggingError> {
    let filter = build_filter(ctx)?;
    let registry = tracing_subscriber::registry().with(filter);

    let (file_layer, guard, log_path) = match destination {
        LoggingDestination::FileAndStderr | LoggingDestination::FileOnly => {
            let dir = config_directory().join("logs");
            fs::create_dir_all(&dir)?;
            let path = dir.join(LOG_FILE_NAME);
            let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
            let (writer, worker_guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .event_format(
                    tracing_subscriber::fmt::format()
                        .json()
                        .with_timer(UtcTime::rfc_3339())
                        .with_level(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(worker_guard), Some(path))
        }
        LoggingDestination::StderrOnly => (None, None, None),
    };

    let stderr_layer = match destination {
        LoggingDestination::FileOnly => None,
        LoggingDestination::FileAndStderr | LoggingDestination::StderrOnly => Some(
            tracing_subscriber::fmt::layer()
                .event_format(
                    tracing_subscriber::fmt::format()
                        .with_timer(LocalTime::rfc_3339())
                        .with_level(true)
                        .with_target(true)
                        .with_ansi(false),
                )
                .with_writer(io::stderr)
                .with_ansi(false)
                .boxed(),
        ),
    };

    registry.with(file_layer).with(stderr_layer).try_init()?;

    if let Some(path) = log_path.as_ref() {
        info!(path = %path.display(), "Structured logging enabled");
    }

    Ok(LoggingGuards {
        _guard: guard,
        log_path,
    })
}

fn build_filter(ctx: &InvocationContext) -> Result<EnvFilter, ParseError> {
    if let Some(directives) = ctx.env_var(LOG_FILTER_VAR) {
        if !directives.trim().is_empty() {
            return EnvFilter::try_new(directives);
        }
    }

    match ctx.env_var(EnvFilter::DEFAULT_ENV) {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new("info"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_build_filter_prefers_runway_log() {
        let env = HashMap::from([
            (LOG_FILTER_VAR.to_string(), "debug".to_string()),
            ("RUST_LOG".to_string(), "not a [valid filter".to_string()),
        ]);
        let ctx = InvocationContext::new(Vec::<String>::new(), env, "/");
        let filter = build_filter(&ctx).expect("RUNWAY_LOG wins over RUST_LOG");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_build_filter_defaults_to_info() {
        let ctx = InvocationContext::new(Vec::<String>::new(), HashMap::new(), "/");
        let filter = build_filter(&ctx).expect("default filter");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_stderr_logging_has_no_log_path() {
        let ctx = InvocationContext::new(Vec::<String>::new(), HashMap::new(), "/");
        let path = init_logging(LoggingDestination::StderrOnly, &ctx).expect("logging installs");
        assert!(path.is_none());
        assert_eq!(current_log_path(), path);
        assert!(
            init_logging(LoggingDestination::FileOnly, &ctx)
                .expect("second call is a no-op")
                .is_none()
        );
    }
}
