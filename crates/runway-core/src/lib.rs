//! Core library crate shared by the runway dispatcher and its tools.

pub mod command;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod logging;
pub mod platform;
pub mod process;
pub mod project;
pub mod toolchain;
pub mod ui;
pub mod version;

pub use command::CommandEntryPoint;
pub use config::{
    ConfigError, ConfigKey, ConfigValue, RunConfiguration, config_directory, find_configuration_file,
};
pub use context::InvocationContext;
pub use device::{Device, DeviceCatalog, DeviceError, SimctlCatalog};
pub use error::RunwayError;
pub use logging::{LoggingDestination, LoggingError, current_log_path, init_logging};
pub use platform::Platform;
pub use project::{
    Project, ProjectError, ProjectLoader, XcodeProject, XcodeProjectLoader, detect_projects,
};
pub use toolchain::{ToolchainError, ToolchainProbe, XcodebuildToolchain};
pub use version::Version;
