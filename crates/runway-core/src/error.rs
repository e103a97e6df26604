use thiserror::Error;

use crate::config::ConfigError;
use crate::device::DeviceError;
use crate::project::ProjectError;
use crate::toolchain::ToolchainError;

/// Fatal, user-facing failures of a runway invocation.
///
/// Every variant aborts the run with a non-zero exit code.
#[derive(Debug, Error)]
pub enum RunwayError {
    /// The named tool is known but has no command entry point.
    #[error("{tool} can't be called via `runway {tool}`, run '{tool}' directly instead")]
    ToolNotInvocable { tool: String },
    /// The machine lacks something the run needs (simulators, a project, an engine).
    #[error("{0}")]
    EnvironmentUnavailable(String),
    /// A lane ran and reported failure.
    #[error("lane '{lane}' failed: {status}")]
    LaneFailed { lane: String, status: String },
    /// The arguments could not be parsed; carries the rendered parser message.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunwayError {
    pub fn environment<T: Into<String>>(message: T) -> Self {
        RunwayError::EnvironmentUnavailable(message.into())
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunwayError::Usage(_) => 2,
            _ => 1,
        }
    }
}
