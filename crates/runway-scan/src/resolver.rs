//! Completes a partially filled run configuration.
//!
//! Resolution runs in a fixed order: configuration file in the working directory, project
//! detection, configuration file next to the project, scheme selection, default devices,
//! destinations, derived data. Each step only fills keys that are still absent.

use std::path::{Path, PathBuf};

use runway_core::{
    ConfigKey, Device, DeviceCatalog, Platform, Project, ProjectLoader, RunConfiguration,
    ToolchainProbe, Version, ui,
};
use tracing::{debug, warn};

use crate::destination::{desktop_platform_name, destination};
use crate::error::ResolveError;

const BUILT_PRODUCTS_DIR: &str = "BUILT_PRODUCTS_DIR";
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Per-platform inputs of the default-device algorithm.
#[derive(Debug, Clone, Copy)]
struct DeviceProfile {
    platform: Platform,
    deployment_target_key: &'static str,
    preferred_simulator: &'static str,
}

const IOS_PROFILE: DeviceProfile = DeviceProfile {
    platform: Platform::Ios,
    deployment_target_key: "IPHONEOS_DEPLOYMENT_TARGET",
    preferred_simulator: "iPhone 5s",
};

const TVOS_PROFILE: DeviceProfile = DeviceProfile {
    platform: Platform::Tvos,
    deployment_target_key: "TVOS_DEPLOYMENT_TARGET",
    preferred_simulator: "Apple TV 1080p",
};

/// Category of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A requested value matched nothing; a fallback was used.
    UserInputAmbiguity,
    /// Explicit input overrides what the other options would produce.
    UserConfigurationConflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Outcome of a resolution pass.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: RunConfiguration,
    pub project_path: PathBuf,
    pub platform: Platform,
    pub scheme: Option<String>,
    /// Devices the run targets, in destination order.
    pub devices: Vec<Device>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn destinations(&self) -> Vec<String> {
        self.config
            .get_list(ConfigKey::Destination)
            .unwrap_or_default()
    }
}

/// Fills in project, devices, destinations and derived data for a test run.
pub struct Resolver<'a> {
    devices: &'a dyn DeviceCatalog,
    toolchain: &'a dyn ToolchainProbe,
    projects: &'a dyn ProjectLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(
        devices: &'a dyn DeviceCatalog,
        toolchain: &'a dyn ToolchainProbe,
        projects: &'a dyn ProjectLoader,
    ) -> Self {
        Self {
            devices,
            toolchain,
            projects,
        }
    }

    pub fn resolve(
        &self,
        mut config: RunConfiguration,
        working_dir: &Path,
    ) -> Result<Resolution, ResolveError> {
        let mut diagnostics = Vec::new();

        load_configuration(&mut config, working_dir)?;

        self.projects.detect_projects(&mut config, working_dir)?;
        let mut project = self.projects.open(&config, working_dir)?;

        let project_dir = project
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| working_dir.to_path_buf());
        if project_dir != working_dir {
            load_configuration(&mut config, &project_dir)?;
        }

        project.select_scheme(&config)?;

        let platform = project.platform();
        debug!(platform = %platform, "Detected project platform");
        let devices = match platform {
            Platform::Ios => {
                self.default_devices(&config, project.as_ref(), IOS_PROFILE, &mut diagnostics)?
            }
            Platform::Tvos => {
                self.default_devices(&config, project.as_ref(), TVOS_PROFILE, &mut diagnostics)?
            }
            Platform::Macos | Platform::Other => Vec::new(),
        };

        self.detect_destination(&mut config, platform, &devices, &mut diagnostics)?;
        default_derived_data(&mut config, project.as_ref());

        Ok(Resolution {
            config,
            project_path: project.path().to_path_buf(),
            platform,
            scheme: project.scheme().map(str::to_string),
            devices,
            diagnostics,
        })
    }

    fn default_devices(
        &self,
        config: &RunConfiguration,
        project: &dyn Project,
        profile: DeviceProfile,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Device>, ResolveError> {
        let requested = config
            .get_list(ConfigKey::Devices)
            .or_else(|| config.get_list(ConfigKey::Device))
            .unwrap_or_default();
        let deployment_target = project.build_setting(profile.deployment_target_key);

        if !requested.is_empty() {
            let catalog = match self.devices.all(profile.platform) {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!(error = %err, "Could not enumerate devices for lookup");
                    Vec::new()
                }
            };
            let found = match_requested_devices(
                &requested,
                deployment_target.as_deref(),
                &catalog,
                diagnostics,
            );
            if !found.is_empty() {
                return Ok(found);
            }
            report(
                diagnostics,
                DiagnosticKind::UserInputAmbiguity,
                format!(
                    "Couldn't find any matching device for '{}' - falling back to default simulator",
                    requested.join(", ")
                ),
            );
        }

        let simulators = self.devices.simulators(profile.platform)?;
        let candidates = filter_simulators(simulators, deployment_target.as_deref());
        let chosen = candidates
            .iter()
            .find(|device| device.name == profile.preferred_simulator)
            .or_else(|| candidates.first())
            .cloned();

        match chosen {
            Some(device) => {
                debug!(device = %device.display_name(), "Selected default simulator");
                Ok(vec![device])
            }
            None => Err(ResolveError::NoSimulators {
                platform: profile.platform,
            }),
        }
    }

    fn detect_destination(
        &self,
        config: &mut RunConfiguration,
        platform: Platform,
        devices: &[Device],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), ResolveError> {
        if let Some(explicit) = config.get(ConfigKey::Destination) {
            ui::important("It's not recommended to set the `destination` value directly");
            ui::important("Instead use the other options available in `scan --help`");
            ui::important(format!("Using your value '{explicit}' for now"));
            ui::important("because I trust you know what you're doing...");
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UserConfigurationConflict,
                message: format!("explicit destination '{explicit}' overrides device options"),
            });
            return Ok(());
        }

        let destinations = match platform {
            Platform::Ios | Platform::Tvos => devices
                .iter()
                .map(|device| destination(platform.as_str(), Some(device)))
                .collect(),
            Platform::Macos | Platform::Other => {
                let version = self.toolchain.toolchain_version()?;
                vec![destination(desktop_platform_name(&version), None)]
            }
        };
        config.set_if_absent(ConfigKey::Destination, destinations);
        Ok(())
    }
}

fn load_configuration(config: &mut RunConfiguration, dir: &Path) -> Result<(), ResolveError> {
    if let Some(path) = config.load_from_directory(dir)? {
        ui::verbose(format!("Successfully loaded '{}'", path.display()));
    }
    Ok(())
}

fn report(diagnostics: &mut Vec<Diagnostic>, kind: DiagnosticKind, message: String) {
    ui::error(&message);
    diagnostics.push(Diagnostic { kind, message });
}

/// Looks up each requested device in `catalog`, reporting the ones that match nothing.
fn match_requested_devices(
    requested: &[String],
    deployment_target: Option<&str>,
    catalog: &[Device],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Device> {
    let mut found = Vec::new();
    for device in requested {
        let lookup = lookup_string(device, deployment_target);
        match catalog
            .iter()
            .find(|candidate| candidate.display_name().contains(&lookup))
        {
            Some(candidate) => found.push(candidate.clone()),
            None => {
                let mut message = format!("Ignoring '{device}', couldn't find matching device");
                if let Some(suggestion) = closest_device(&lookup, catalog) {
                    message.push_str(&format!(" (did you mean '{suggestion}'?)"));
                }
                report(diagnostics, DiagnosticKind::UserInputAmbiguity, message);
            }
        }
    }
    found
}

/// String a requested device must be contained in, as `name version`.
///
/// Parentheses are removed. The deployment target is appended unless the request already
/// carries a version, either in parentheses or by mentioning the target itself.
pub fn lookup_string(requested: &str, deployment_target: Option<&str>) -> String {
    let trimmed = requested.trim();
    let target = deployment_target
        .map(str::trim)
        .filter(|target| !target.is_empty());
    let has_version = trimmed.contains('(') || target.is_some_and(|t| trimmed.contains(t));
    let stripped: String = trimmed.chars().filter(|c| !matches!(c, '(' | ')')).collect();

    match target {
        Some(target) if !has_version => format!("{stripped} {target}"),
        _ => stripped,
    }
}

/// Keeps simulators whose OS version is at least the deployment target.
///
/// Without a parseable target nothing is filtered; simulators with unparseable versions
/// are dropped otherwise.
pub fn filter_simulators(simulators: Vec<Device>, deployment_target: Option<&str>) -> Vec<Device> {
    let Some(target) = deployment_target.and_then(Version::parse) else {
        return simulators;
    };
    simulators
        .into_iter()
        .filter(|device| Version::parse(&device.os_version).is_some_and(|version| version >= target))
        .collect()
}

fn closest_device(lookup: &str, catalog: &[Device]) -> Option<String> {
    catalog
        .iter()
        .map(|device| {
            let name = device.display_name();
            (strsim::jaro_winkler(lookup, &name), name)
        })
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name)
}

/// Walks up from `<DerivedData>/<project-hash>/Build/Products/<config>` to
/// `<DerivedData>/<project-hash>`, stopping at the root of shallower paths.
pub fn derived_data_from_products_dir(products_dir: &Path) -> PathBuf {
    products_dir
        .ancestors()
        .take(4)
        .last()
        .unwrap_or(products_dir)
        .to_path_buf()
}

fn default_derived_data(config: &mut RunConfiguration, project: &dyn Project) {
    if config.contains(ConfigKey::DerivedDataPath) {
        return;
    }
    let Some(products_dir) = project.build_setting(BUILT_PRODUCTS_DIR) else {
        debug!("No BUILT_PRODUCTS_DIR build setting; leaving derived data path unset");
        return;
    };
    let derived = derived_data_from_products_dir(Path::new(&products_dir));
    ui::verbose(format!("Detected derived data path '{}'", derived.display()));
    config.set_if_absent(
        ConfigKey::DerivedDataPath,
        derived.to_string_lossy().into_owned(),
    );
}
