//! Routes an invocation to a named tool or to the default lane command.

use std::collections::BTreeSet;
use std::time::Duration;

use runway_core::{CommandEntryPoint, InvocationContext, RunwayError};
use tracing::{debug, info};

use crate::lanes::LaneLister;
use crate::manifest::ManifestProbe;
use crate::slow_start::{DEFAULT_PAUSE, SLOW_STARTUP_THRESHOLD, emit_slow_startup_warning};
use crate::tools::ToolRegistry;

/// Where an invocation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A built-in tool, with the tool name removed from the arguments.
    Tool { name: String, args: Vec<String> },
    /// The default entry point, with the arguments untouched.
    Default { args: Vec<String> },
}

/// Whether `-v` or `--version` appears anywhere in `args`.
pub fn is_version_query(args: &[String]) -> bool {
    args.iter().any(|arg| arg == "-v" || arg == "--version")
}

/// Picks the route for `args`.
///
/// A lane named like a tool takes precedence over the tool.
pub fn route(args: &[String], registry: &ToolRegistry, lanes: &BTreeSet<String>) -> Route {
    let tool_name = args.first().map(|arg| arg.to_lowercase()).unwrap_or_default();
    if !tool_name.is_empty() && registry.contains(&tool_name) && !lanes.contains(&tool_name) {
        return Route::Tool {
            name: tool_name,
            args: args[1..].to_vec(),
        };
    }
    Route::Default {
        args: args.to_vec(),
    }
}

/// Runs one invocation to completion on the route its arguments select.
pub struct Dispatcher {
    registry: ToolRegistry,
    lanes: Box<dyn LaneLister>,
    manifest: Box<dyn ManifestProbe>,
    default_entry: Box<dyn CommandEntryPoint>,
    pause: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: ToolRegistry,
        lanes: Box<dyn LaneLister>,
        manifest: Box<dyn ManifestProbe>,
        default_entry: Box<dyn CommandEntryPoint>,
    ) -> Self {
        Self {
            registry,
            lanes,
            manifest,
            default_entry,
            pause: DEFAULT_PAUSE,
        }
    }

    /// Overrides the pause after the slow-startup advice.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Dispatches `ctx`; `startup` is the time spent before dispatch began.
    pub fn dispatch(&self, ctx: &InvocationContext, startup: Duration) -> Result<(), RunwayError> {
        if startup > SLOW_STARTUP_THRESHOLD && !is_version_query(ctx.args()) {
            debug!(startup_ms = startup.as_millis() as u64, "Slow startup");
            emit_slow_startup_warning(ctx, self.manifest.as_ref(), self.pause);
        }

        let lanes = self.lanes.available_lanes(ctx.working_dir());
        match route(ctx.args(), &self.registry, &lanes) {
            Route::Tool { name, args } => {
                info!(tool = %name, "Dispatching to tool");
                let entry = self.registry.load(&name)?;
                entry.start(&ctx.with_args(args))
            }
            Route::Default { .. } => {
                info!(entry = self.default_entry.name(), "Dispatching to default command");
                self.default_entry.start(ctx)
            }
        }
    }
}
