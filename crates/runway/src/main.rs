//! Main entry point for runway.

use std::time::Instant;

use anyhow::{Context, Result};
use runway::default_dispatcher;
use runway_core::ui::{self, UiSettings};
use runway_core::{InvocationContext, LoggingDestination, init_logging};

fn main() -> Result<()> {
    let started = Instant::now();

    let ctx = InvocationContext::from_process().context("could not read the working directory")?;
    ui::configure(UiSettings::from_context(&ctx));
    if let Err(err) = init_logging(LoggingDestination::FileOnly, &ctx) {
        ui::important(format!("Logging disabled: {err}"));
    }
    let dispatcher = default_dispatcher();

    if let Err(err) = dispatcher.dispatch(&ctx, started.elapsed()) {
        eprintln!("{}", ui::red(&err));
        std::process::exit(err.exit_code());
    }
    Ok(())
}
