use runway_core::ui::{self, UiSettings};
use runway_core::{CommandEntryPoint, InvocationContext, LoggingDestination, init_logging};
use runway_scan::ScanCommand;

fn main() {
    let ctx = match InvocationContext::from_process() {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("Error: could not read the working directory: {err}");
            std::process::exit(1);
        }
    };
    ui::configure(UiSettings::from_context(&ctx));

    if let Err(err) = init_logging(LoggingDestination::FileOnly, &ctx) {
        ui::important(format!("Logging disabled: {err}"));
    }

    if let Err(err) = ScanCommand::new().start(&ctx) {
        eprintln!("{}", ui::red(&err));
        std::process::exit(err.exit_code());
    }
}
