//! Physical devices and simulators a test run can target.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::platform::Platform;
use crate::process::{ProcessError, run_capture};

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";

/// Errors raised while enumerating devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("failed to parse device list: {0}")]
    Parse(String),
}

/// A connected device or an available simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub os_version: String,
    pub udid: String,
    pub platform: Platform,
    pub is_simulator: bool,
}

impl Device {
    /// `name` followed by the OS version, the form device lookups match against.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.os_version)
    }
}

/// Source of devices for a platform. Each call returns entries in enumeration order.
pub trait DeviceCatalog {
    /// Connected devices followed by simulators.
    fn all(&self, platform: Platform) -> Result<Vec<Device>, DeviceError>;

    /// Available simulators only.
    fn simulators(&self, platform: Platform) -> Result<Vec<Device>, DeviceError>;
}

/// Catalog backed by `xcrun simctl` and `xcrun xctrace`.
///
/// Each listing is taken once per catalog and reused for later queries.
#[derive(Debug, Default)]
pub struct SimctlCatalog {
    simulators: OnceLock<Vec<Device>>,
    connected: OnceLock<Vec<Device>>,
}

impl SimctlCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn simulator_snapshot(&self) -> Result<&[Device], DeviceError> {
        if let Some(devices) = self.simulators.get() {
            return Ok(devices);
        }
        let raw = run_capture("xcrun", &["simctl", "list", "devices", "-j"])?;
        let devices = parse_simctl_devices(&raw)?;
        debug!(count = devices.len(), "Enumerated simulators");
        Ok(self.simulators.get_or_init(|| devices))
    }

    fn connected_snapshot(&self) -> &[Device] {
        self.connected.get_or_init(|| {
            match run_capture("xcrun", &["xctrace", "list", "devices"]) {
                Ok(raw) => parse_xctrace_devices(&raw),
                Err(err) => {
                    warn!(error = %err, "Could not list connected devices");
                    Vec::new()
                }
            }
        })
    }
}

impl DeviceCatalog for SimctlCatalog {
    fn all(&self, platform: Platform) -> Result<Vec<Device>, DeviceError> {
        let mut devices: Vec<Device> = self
            .connected_snapshot()
            .iter()
            .filter(|device| device.platform == platform)
            .cloned()
            .collect();
        devices.extend(self.simulators(platform)?);
        Ok(devices)
    }

    fn simulators(&self, platform: Platform) -> Result<Vec<Device>, DeviceError> {
        Ok(self
            .simulator_snapshot()?
            .iter()
            .filter(|device| device.platform == platform)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SimctlListing {
    devices: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimctlDevice {
    name: String,
    udid: String,
    #[serde(default)]
    is_available: Option<bool>,
    #[serde(default)]
    availability: Option<String>,
}

impl SimctlDevice {
    fn available(&self) -> bool {
        match (self.is_available, self.availability.as_deref()) {
            (Some(flag), _) => flag,
            (None, Some(text)) => !text.contains("unavailable"),
            (None, None) => true,
        }
    }
}

/// Splits a runtime identifier into a platform and a dotted version.
///
/// Accepts `com.apple.CoreSimulator.SimRuntime.iOS-14-0` and the legacy `iOS 14.0`.
fn parse_runtime(runtime: &str) -> Option<(Platform, String)> {
    let (name, version) = match runtime.strip_prefix(RUNTIME_PREFIX) {
        Some(rest) => {
            let (name, version) = rest.split_once('-')?;
            (name, version.replace('-', "."))
        }
        None => {
            let (name, version) = runtime.split_once(' ')?;
            (name, version.trim().to_string())
        }
    };
    let platform = match name {
        "iOS" => Platform::Ios,
        "tvOS" => Platform::Tvos,
        _ => Platform::Other,
    };
    Some((platform, version))
}

/// Parses the JSON printed by `xcrun simctl list devices -j`.
///
/// Runtime groups keep the order simctl printed them in; unavailable simulators are skipped.
pub fn parse_simctl_devices(raw: &str) -> Result<Vec<Device>, DeviceError> {
    let listing: SimctlListing =
        serde_json::from_str(raw).map_err(|err| DeviceError::Parse(err.to_string()))?;

    let mut devices = Vec::new();
    for (runtime, entries) in listing.devices {
        let Some((platform, os_version)) = parse_runtime(&runtime) else {
            debug!(runtime = %runtime, "Skipping unrecognised simulator runtime");
            continue;
        };
        let entries: Vec<SimctlDevice> =
            serde_json::from_value(entries).map_err(|err| DeviceError::Parse(err.to_string()))?;
        devices.extend(
            entries
                .into_iter()
                .filter(SimctlDevice::available)
                .map(|entry| Device {
                    name: entry.name,
                    os_version: os_version.clone(),
                    udid: entry.udid,
                    platform,
                    is_simulator: true,
                }),
        );
    }
    Ok(devices)
}

/// Parses the `== Devices ==` section printed by `xcrun xctrace list devices`.
///
/// Lines without an OS version (the host Mac) are skipped.
pub fn parse_xctrace_devices(raw: &str) -> Vec<Device> {
    let pattern = device_line_pattern();
    let mut in_devices = false;
    let mut devices = Vec::new();

    for line in raw.lines().map(str::trim) {
        if line.starts_with("==") {
            in_devices = line == "== Devices ==";
            continue;
        }
        if !in_devices || line.is_empty() {
            continue;
        }
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        let name = captures[1].to_string();
        let platform = if name.contains("Apple TV") {
            Platform::Tvos
        } else {
            Platform::Ios
        };
        devices.push(Device {
            name,
            os_version: captures[2].to_string(),
            udid: captures[3].to_string(),
            platform,
            is_simulator: false,
        });
    }
    devices
}

fn device_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?) \(([0-9][0-9.]*)\) \(([0-9A-Za-z-]+)\)$")
            .expect("device line pattern is valid")
    })
}
