use std::sync::OnceLock;

use thiserror::Error;

use crate::process::{ProcessError, run_capture};
use crate::version::Version;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("unrecognised toolchain version output: {0:?}")]
    UnrecognisedVersion(String),
}

/// Reports the installed build toolchain version.
pub trait ToolchainProbe {
    fn toolchain_version(&self) -> Result<Version, ToolchainError>;
}

/// Probe backed by `xcodebuild -version`; the answer is cached after the first call.
#[derive(Debug, Default)]
pub struct XcodebuildToolchain {
    version: OnceLock<Version>,
}

impl XcodebuildToolchain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolchainProbe for XcodebuildToolchain {
    fn toolchain_version(&self) -> Result<Version, ToolchainError> {
        if let Some(version) = self.version.get() {
            return Ok(version.clone());
        }
        let raw = run_capture("xcodebuild", &["-version"])?;
        let version = parse_xcodebuild_version(&raw)?;
        Ok(self.version.get_or_init(|| version).clone())
    }
}

/// Extracts `14.2` from output whose first line reads `Xcode 14.2`.
pub fn parse_xcodebuild_version(raw: &str) -> Result<Version, ToolchainError> {
    raw.lines()
        .next()
        .and_then(|line| line.trim().strip_prefix("Xcode"))
        .and_then(|rest| Version::parse(rest.trim()))
        .ok_or_else(|| ToolchainError::UnrecognisedVersion(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xcodebuild_version() {
        let version = parse_xcodebuild_version("Xcode 14.2\nBuild version 14C18\n").unwrap();
        assert_eq!(version.to_string(), "14.2");
        assert_eq!(version.major(), 14);

        let legacy = parse_xcodebuild_version("Xcode 7.3.1\nBuild version 7D1014").unwrap();
        assert_eq!(legacy.major(), 7);
    }

    #[test]
    fn test_parse_xcodebuild_version_rejects_other_output() {
        assert!(matches!(
            parse_xcodebuild_version("xcode-select: error: tool 'xcodebuild' requires Xcode"),
            Err(ToolchainError::UnrecognisedVersion(_))
        ));
    }
}
