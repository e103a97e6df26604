use runway_core::{ConfigError, DeviceError, Platform, ProjectError, RunwayError, ToolchainError};
use thiserror::Error;

/// Failures that stop configuration resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Not a single simulator survived filtering.
    #[error("{}", no_simulators_message(.platform))]
    NoSimulators { platform: Platform },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

fn no_simulators_message(platform: &Platform) -> &'static str {
    match platform {
        Platform::Tvos => "No TV simulators found on the local machine",
        _ => "No simulators found on local machine",
    }
}

impl From<ResolveError> for RunwayError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::NoSimulators { .. } => RunwayError::environment(value.to_string()),
            ResolveError::Config(err) => RunwayError::Config(err),
            ResolveError::Project(err) => RunwayError::Project(err),
            ResolveError::Device(err) => RunwayError::Device(err),
            ResolveError::Toolchain(err) => RunwayError::Toolchain(err),
        }
    }
}
