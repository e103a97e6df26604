//! The `scan` test runner: resolves a run configuration and prints the test command.

pub mod cli_args;
pub mod destination;
pub mod error;
pub mod resolver;
pub mod xcodebuild;

use clap::Parser;
use clap::error::ErrorKind;
use runway_core::{
    CommandEntryPoint, InvocationContext, RunwayError, SimctlCatalog, XcodeProjectLoader,
    XcodebuildToolchain, current_log_path, ui,
};
use tracing::info;

pub use cli_args::ScanArgs;
pub use error::ResolveError;
pub use resolver::{Diagnostic, DiagnosticKind, Resolution, Resolver};

pub const TOOL_NAME: &str = "scan";

/// Entry point used by both the `scan` binary and `runway scan`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanCommand;

impl ScanCommand {
    pub fn new() -> Self {
        Self
    }
}

impl CommandEntryPoint for ScanCommand {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn start(&self, ctx: &InvocationContext) -> Result<(), RunwayError> {
        let Some(args) = parse_args(ctx)? else {
            return Ok(());
        };
        if args.verbose {
            ui::enable_verbose();
        }
        if let Some(path) = current_log_path() {
            ui::verbose(format!("Writing logs to '{}'", path.display()));
        }

        let devices = SimctlCatalog::new();
        let toolchain = XcodebuildToolchain::new();
        let projects = XcodeProjectLoader;
        let resolver = Resolver::new(&devices, &toolchain, &projects);

        let resolution = run(&args, ctx, &resolver)?;
        print_summary(&resolution);
        Ok(())
    }
}

/// Parses the tool's arguments; `None` when clap already printed help or version text.
pub fn parse_args(ctx: &InvocationContext) -> Result<Option<ScanArgs>, RunwayError> {
    let argv = std::iter::once(TOOL_NAME.to_string()).chain(ctx.args().iter().cloned());
    match ScanArgs::try_parse_from(argv) {
        Ok(args) => Ok(Some(args)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            Ok(None)
        }
        Err(err) => Err(RunwayError::Usage(err.render().to_string())),
    }
}

/// Resolves the configuration for `args` in the context's working directory.
pub fn run(
    args: &ScanArgs,
    ctx: &InvocationContext,
    resolver: &Resolver<'_>,
) -> Result<Resolution, RunwayError> {
    let config = args.to_configuration();
    let resolution = resolver.resolve(config, ctx.working_dir())?;
    info!(
        project = %resolution.project_path.display(),
        platform = %resolution.platform,
        devices = resolution.devices.len(),
        diagnostics = resolution.diagnostics.len(),
        "Resolved test configuration"
    );
    Ok(resolution)
}

/// Rows of the resolved-configuration table, in key order.
pub fn summary_rows(resolution: &Resolution) -> Vec<(String, String)> {
    let mut rows = vec![
        (
            "project_path".to_string(),
            resolution.project_path.display().to_string(),
        ),
        ("platform".to_string(), resolution.platform.to_string()),
    ];
    if let Some(scheme) = resolution.scheme.as_deref() {
        rows.push(("scheme".to_string(), scheme.to_string()));
    }
    rows.extend(
        resolution
            .config
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );
    if !resolution.devices.is_empty() {
        let devices: Vec<String> = resolution
            .devices
            .iter()
            .map(|device| device.display_name())
            .collect();
        rows.push(("resolved_devices".to_string(), devices.join(", ")));
    }
    rows
}

fn print_summary(resolution: &Resolution) {
    let rows = summary_rows(resolution);
    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    ui::message("");
    ui::message("Summary for scan");
    for (key, value) in &rows {
        ui::message(format!("  {key:<width$}  {value}"));
    }
    ui::message("");

    let args = xcodebuild::test_arguments(resolution);
    ui::success("Test command:");
    ui::command(xcodebuild::render_command(&args));
}
