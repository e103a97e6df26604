//! Advice printed when `runway` took long to start.

use std::thread;
use std::time::Duration;

use runway_core::{InvocationContext, ui};

use crate::manifest::ManifestProbe;

/// Startup time after which the advice is shown.
pub const SLOW_STARTUP_THRESHOLD: Duration = Duration::from_secs(3);
/// Pause after the advice so it does not scroll away unread.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Set by `bundle exec`.
const BUNDLER_MARKER: &str = "BUNDLE_BIN_PATH";
const GEMFILE_GUIDE: &str = "https://guides.cocoapods.org/using/a-gemfile.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceLine {
    Important(String),
    Message(String),
    Command(String),
}

fn important(text: impl Into<String>) -> AdviceLine {
    AdviceLine::Important(text.into())
}

fn blank() -> AdviceLine {
    AdviceLine::Message(String::new())
}

fn command(text: impl Into<String>) -> AdviceLine {
    AdviceLine::Command(text.into())
}

/// Lines of advice for this invocation, `None` when it already runs through the bundler.
pub fn slow_startup_advice(
    ctx: &InvocationContext,
    manifest: &dyn ManifestProbe,
) -> Option<Vec<AdviceLine>> {
    if ctx.has_env(BUNDLER_MARKER) {
        return None;
    }

    let mut lines = if manifest.manifest_path(ctx.working_dir()).is_some() {
        let invocation = std::iter::once("bundle exec runway".to_string())
            .chain(ctx.args().iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        vec![
            important("Seems like launching runway takes a while"),
            important("runway detected a Gemfile in this directory"),
            important("however it seems like you don't use `bundle exec`"),
            important("to launch runway faster, please use"),
            blank(),
            command(invocation),
        ]
    } else {
        vec![
            important("Seems like launching runway takes a while - please run"),
            blank(),
            command("[sudo] gem cleanup"),
            blank(),
            important("to uninstall outdated gems and make runway launch faster"),
            important(
                "Alternatively it's recommended to start using a Gemfile to lock your dependencies",
            ),
            important("To get started with a Gemfile, run"),
            blank(),
            command("bundle init"),
            command("echo 'gem \"runway\"' >> Gemfile"),
            command("bundle install"),
            blank(),
            important(
                "After creating the Gemfile and Gemfile.lock, commit those files into version control",
            ),
        ]
    };
    lines.push(important(format!(
        "For more information, check out {GEMFILE_GUIDE}"
    )));
    Some(lines)
}

/// Prints the advice and pauses for `pause`. Never fails.
pub fn emit_slow_startup_warning(
    ctx: &InvocationContext,
    manifest: &dyn ManifestProbe,
    pause: Duration,
) {
    let Some(lines) = slow_startup_advice(ctx, manifest) else {
        return;
    };
    for line in lines {
        match line {
            AdviceLine::Important(text) => ui::important(text),
            AdviceLine::Message(text) => ui::message(text),
            AdviceLine::Command(text) => ui::command(text),
        }
    }
    if !pause.is_zero() {
        thread::sleep(pause);
    }
}
