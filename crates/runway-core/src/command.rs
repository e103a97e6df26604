use crate::context::InvocationContext;
use crate::error::RunwayError;

/// Command-parsing entry point of a tool.
///
/// The context handed to [`CommandEntryPoint::start`] no longer contains the tool name;
/// the arguments are exactly what the tool's own parser should see.
pub trait CommandEntryPoint {
    /// Name the tool is invoked by.
    fn name(&self) -> &'static str;

    /// Parses the arguments and runs the tool to completion.
    fn start(&self, ctx: &InvocationContext) -> Result<(), RunwayError>;
}
