//! Human-facing terminal output.
//!
//! Messages are written to stderr and mirrored into the structured log, so a run can be
//! reconstructed from the log file even when the terminal scrolled away.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::InvocationContext;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Process-wide output settings, installed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSettings {
    pub color: bool,
    pub verbose: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            color: true,
            verbose: false,
        }
    }
}

impl UiSettings {
    /// Color is disabled by `NO_COLOR`; verbose output is enabled by `RUNWAY_VERBOSE`.
    pub fn from_context(ctx: &InvocationContext) -> Self {
        Self {
            color: !ctx.has_env("NO_COLOR"),
            verbose: ctx.has_env("RUNWAY_VERBOSE"),
        }
    }
}

static COLOR: AtomicBool = AtomicBool::new(true);
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Install output settings for the process.
pub fn configure(settings: UiSettings) {
    COLOR.store(settings.color, Ordering::Relaxed);
    VERBOSE.store(settings.verbose, Ordering::Relaxed);
}

/// Turns verbose output on, e.g. from a tool's `--verbose` flag.
pub fn enable_verbose() {
    VERBOSE.store(true, Ordering::Relaxed);
}

/// Whether verbose output was requested for this process.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

fn paint(color: &str, message: &str) -> String {
    if COLOR.load(Ordering::Relaxed) {
        format!("{color}{message}{RESET}")
    } else {
        message.to_string()
    }
}

/// Wraps `message` in red when color is enabled.
pub fn red(message: impl Display) -> String {
    paint(RED, &message.to_string())
}

/// Something the user should notice but that does not stop the run.
pub fn important(message: impl Display) {
    let message = message.to_string();
    tracing::warn!(target: "runway::ui", "{message}");
    eprintln!("{}", paint(YELLOW, &message));
}

pub fn message(message: impl Display) {
    let message = message.to_string();
    tracing::info!(target: "runway::ui", "{message}");
    eprintln!("{message}");
}

/// A command line the user can copy.
pub fn command(command: impl Display) {
    let command = command.to_string();
    tracing::info!(target: "runway::ui", command = %command, "Suggested command");
    eprintln!("{}", paint(CYAN, &format!("$ {command}")));
}

pub fn success(message: impl Display) {
    let message = message.to_string();
    tracing::info!(target: "runway::ui", "{message}");
    eprintln!("{}", paint(GREEN, &message));
}

/// A non-fatal error; the run continues.
pub fn error(message: impl Display) {
    let message = message.to_string();
    tracing::error!(target: "runway::ui", "{message}");
    eprintln!("{}", paint(RED, &message));
}

/// Diagnostic detail, shown only in verbose mode.
pub fn verbose(message: impl Display) {
    let message = message.to_string();
    tracing::debug!(target: "runway::ui", "{message}");
    if is_verbose() {
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_from_context() {
        let env = HashMap::from([
            ("NO_COLOR".to_string(), "1".to_string()),
            ("RUNWAY_VERBOSE".to_string(), "1".to_string()),
        ]);
        let ctx = InvocationContext::new(Vec::<String>::new(), env, "/");
        assert_eq!(
            UiSettings::from_context(&ctx),
            UiSettings {
                color: false,
                verbose: true,
            }
        );

        let ctx = InvocationContext::new(Vec::<String>::new(), HashMap::new(), "/");
        assert_eq!(UiSettings::from_context(&ctx), UiSettings::default());
    }
}
