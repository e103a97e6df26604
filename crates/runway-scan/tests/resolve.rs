use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use runway_core::{
    ConfigKey, Device, DeviceCatalog, DeviceError, Platform, Project, ProjectError, ProjectLoader,
    RunConfiguration, ToolchainError, ToolchainProbe, Version,
};
use runway_scan::{DiagnosticKind, ResolveError, Resolver};
use tempfile::tempdir;

struct FakeCatalog {
    connected: Vec<Device>,
    simulators: Vec<Device>,
}

impl FakeCatalog {
    fn with_simulators(simulators: Vec<Device>) -> Self {
        Self {
            connected: Vec::new(),
            simulators,
        }
    }
}

impl DeviceCatalog for FakeCatalog {
    fn all(&self, platform: Platform) -> Result<Vec<Device>, DeviceError> {
        let mut devices: Vec<Device> = self
            .connected
            .iter()
            .filter(|device| device.platform == platform)
            .cloned()
            .collect();
        devices.extend(self.simulators(platform)?);
        Ok(devices)
    }

    fn simulators(&self, platform: Platform) -> Result<Vec<Device>, DeviceError> {
        Ok(self
            .simulators
            .iter()
            .filter(|device| device.platform == platform)
            .cloned()
            .collect())
    }
}

struct FakeToolchain(&'static str);

impl ToolchainProbe for FakeToolchain {
    fn toolchain_version(&self) -> Result<Version, ToolchainError> {
        Version::parse(self.0).ok_or_else(|| ToolchainError::UnrecognisedVersion(self.0.into()))
    }
}

#[derive(Clone)]
struct FakeLoader {
    platform: Platform,
    settings: HashMap<String, String>,
    subdir: Option<&'static str>,
}

impl FakeLoader {
    fn new(platform: Platform, settings: &[(&str, &str)]) -> Self {
        Self {
            platform,
            settings: settings
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            subdir: None,
        }
    }

    fn in_subdir(mut self, subdir: &'static str) -> Self {
        self.subdir = Some(subdir);
        self
    }
}

struct FakeProject {
    path: PathBuf,
    platform: Platform,
    settings: HashMap<String, String>,
    scheme: Option<String>,
}

impl Project for FakeProject {
    fn path(&self) -> &Path {
        &self.path
    }

    fn select_scheme(&mut self, config: &RunConfiguration) -> Result<(), ProjectError> {
        self.scheme = Some(config.get_str(ConfigKey::Scheme).unwrap_or("App").to_string());
        Ok(())
    }

    fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn build_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }
}

impl ProjectLoader for FakeLoader {
    fn detect_projects(
        &self,
        config: &mut RunConfiguration,
        dir: &Path,
    ) -> Result<(), ProjectError> {
        let base = match self.subdir {
            Some(subdir) => dir.join(subdir),
            None => dir.to_path_buf(),
        };
        config.set_if_absent(
            ConfigKey::Workspace,
            base.join("App.xcworkspace").to_string_lossy().into_owned(),
        );
        Ok(())
    }

    fn open(
        &self,
        config: &RunConfiguration,
        working_dir: &Path,
    ) -> Result<Box<dyn Project>, ProjectError> {
        let workspace = config
            .get_str(ConfigKey::Workspace)
            .ok_or_else(|| ProjectError::NotFound {
                dir: working_dir.to_path_buf(),
            })?;
        Ok(Box::new(FakeProject {
            path: working_dir.join(workspace),
            platform: self.platform,
            settings: self.settings.clone(),
            scheme: None,
        }))
    }
}

fn simulator(name: &str, version: &str, udid: &str) -> Device {
    Device {
        name: name.to_string(),
        os_version: version.to_string(),
        udid: udid.to_string(),
        platform: Platform::Ios,
        is_simulator: true,
    }
}

fn tv_simulator(name: &str, version: &str, udid: &str) -> Device {
    Device {
        platform: Platform::Tvos,
        ..simulator(name, version, udid)
    }
}

const PRODUCTS_DIR: &str = "/A/B/DerivedData/app-hash/Build/Products/Debug-iphonesimulator";

fn ios_loader(target: &str) -> FakeLoader {
    FakeLoader::new(
        Platform::Ios,
        &[
            ("IPHONEOS_DEPLOYMENT_TARGET", target),
            ("BUILT_PRODUCTS_DIR", PRODUCTS_DIR),
        ],
    )
}

#[test]
fn test_automatic_selection_prefers_iphone_5s_above_deployment_target() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![
        simulator("iPhone 5s", "12.0", "OLD"),
        simulator("iPhone 8", "13.0", "A"),
        simulator("iPhone 5s", "14.0", "B"),
    ]);
    let loader = ios_loader("13.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let resolution = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .expect("resolved");

    assert_eq!(resolution.devices.len(), 1);
    assert_eq!(resolution.devices[0].udid, "B");
    assert_eq!(
        resolution.destinations(),
        vec!["platform=iOS Simulator,id=B".to_string()]
    );
}

#[test]
fn test_automatic_selection_falls_back_to_first_remaining_simulator() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![
        simulator("iPhone 8", "12.0", "A"),
        simulator("iPhone 11", "13.0", "B"),
        simulator("iPhone 12", "14.0", "C"),
    ]);
    let loader = ios_loader("13.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let resolution = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .expect("resolved");
    assert_eq!(resolution.devices[0].udid, "B");
}

#[test]
fn test_requested_device_matches_with_deployment_target_appended() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog {
        connected: vec![Device {
            is_simulator: false,
            ..simulator("Jane's iPhone", "14.0", "PHONE")
        }],
        simulators: vec![
            simulator("iPhone 8", "13.0", "OLD"),
            simulator("iPhone 8", "14.0", "NEW"),
        ],
    };
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(
        ConfigKey::Devices,
        vec!["iPhone 8".to_string(), "Jane's iPhone".to_string()],
    );
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");

    assert_eq!(
        resolution.destinations(),
        vec![
            "platform=iOS Simulator,id=NEW".to_string(),
            "platform=iOS,id=PHONE".to_string(),
        ]
    );
    assert!(resolution.diagnostics.is_empty());
}

#[test]
fn test_requested_device_with_explicit_version_keeps_it() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![
        simulator("iPhone 8", "13.0", "OLD"),
        simulator("iPhone 8", "14.0", "NEW"),
    ]);
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(ConfigKey::Device, "iPhone 8 (13.0)");
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");
    assert_eq!(resolution.devices[0].udid, "OLD");
}

#[test]
fn test_unmatched_devices_degrade_to_automatic_selection() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 8", "14.0", "A")]);
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(ConfigKey::Devices, vec!["Pixel 7".to_string()]);
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");

    assert_eq!(resolution.devices[0].udid, "A");
    let kinds: Vec<_> = resolution.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::UserInputAmbiguity,
            DiagnosticKind::UserInputAmbiguity
        ]
    );
    assert!(resolution.diagnostics[0].message.contains("'Pixel 7'"));
    assert!(
        resolution.diagnostics[1]
            .message
            .contains("falling back to default simulator")
    );
}

#[test]
fn test_partial_device_matches_do_not_fall_through() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![
        simulator("iPhone 5s", "14.0", "FIVE"),
        simulator("iPad Air", "14.0", "PAD"),
    ]);
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(
        ConfigKey::Devices,
        vec!["Pixel 7".to_string(), "iPad Air".to_string()],
    );
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");

    let udids: Vec<_> = resolution.devices.iter().map(|d| d.udid.as_str()).collect();
    assert_eq!(udids, vec!["PAD"]);
    assert_eq!(resolution.diagnostics.len(), 1);
}

#[test]
fn test_no_simulators_after_filtering_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 8", "12.0", "A")]);
    let loader = ios_loader("13.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let err = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::NoSimulators {
            platform: Platform::Ios
        }
    ));
    assert_eq!(err.to_string(), "No simulators found on local machine");

    let runway: runway_core::RunwayError = err.into();
    assert_ne!(runway.exit_code(), 0);
}

#[test]
fn test_tvos_prefers_apple_tv_1080p() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![
        tv_simulator("Apple TV 4K", "14.0", "FOURK"),
        tv_simulator("Apple TV 1080p", "14.0", "HD"),
        simulator("iPhone 8", "14.0", "PHONE"),
    ]);
    let loader = FakeLoader::new(Platform::Tvos, &[("TVOS_DEPLOYMENT_TARGET", "14.0")]);
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let resolution = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .expect("resolved");
    assert_eq!(
        resolution.destinations(),
        vec!["platform=tvOS Simulator,id=HD".to_string()]
    );
}

#[test]
fn test_tvos_without_simulators_reports_tv_message() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 8", "14.0", "PHONE")]);
    let loader = FakeLoader::new(Platform::Tvos, &[]);
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let err = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .unwrap_err();
    assert_eq!(err.to_string(), "No TV simulators found on the local machine");
}

#[test]
fn test_explicit_destination_is_kept_with_a_warning() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 5s", "14.0", "A")]);
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(ConfigKey::Destination, "platform=iOS,id=ABC");
    config.set_if_absent(ConfigKey::Device, "iPhone 5s");
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");

    assert_eq!(
        resolution.config.get_str(ConfigKey::Destination),
        Some("platform=iOS,id=ABC")
    );
    assert!(
        resolution
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UserConfigurationConflict)
    );
}

#[test]
fn test_desktop_destination_depends_on_toolchain_version() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(Vec::new());
    let loader = FakeLoader::new(Platform::Macos, &[]);

    for (version, expected) in [("9.0", "platform=macOS"), ("7.3.1", "platform=OS X")] {
        let toolchain = FakeToolchain(version);
        let resolver = Resolver::new(&catalog, &toolchain, &loader);
        let resolution = resolver
            .resolve(RunConfiguration::new(), dir.path())
            .expect("resolved");
        assert!(resolution.devices.is_empty());
        assert_eq!(resolution.destinations(), vec![expected.to_string()]);
    }
}

#[test]
fn test_derived_data_path_is_derived_from_built_products_dir() {
    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 5s", "14.0", "A")]);
    let loader = ios_loader("14.0");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let resolution = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .expect("resolved");
    assert_eq!(
        resolution.config.get_str(ConfigKey::DerivedDataPath),
        Some("/A/B/DerivedData/app-hash")
    );

    let mut config = RunConfiguration::new();
    config.set_if_absent(ConfigKey::DerivedDataPath, "/custom/dd");
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");
    assert_eq!(
        resolution.config.get_str(ConfigKey::DerivedDataPath),
        Some("/custom/dd")
    );
}

#[test]
fn test_configuration_files_fill_in_precedence_order() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Scanfile"),
        "scheme = \"FromWorkingDir\"\n",
    )
    .expect("write working dir Scanfile");
    let project_dir = dir.path().join("ios");
    fs::create_dir_all(&project_dir).expect("project dir");
    fs::write(
        project_dir.join("Scanfile"),
        "scheme = \"FromProjectDir\"\nconfiguration = \"Release\"\nclean = true\n",
    )
    .expect("write project Scanfile");

    let catalog = FakeCatalog::with_simulators(vec![simulator("iPhone 5s", "14.0", "A")]);
    let loader = ios_loader("14.0").in_subdir("ios");
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &loader);

    let mut config = RunConfiguration::new();
    config.set_if_absent(ConfigKey::Clean, false);
    let resolution = resolver.resolve(config, dir.path()).expect("resolved");

    assert_eq!(resolution.scheme.as_deref(), Some("FromWorkingDir"));
    assert_eq!(
        resolution.config.get_str(ConfigKey::Configuration),
        Some("Release")
    );
    assert!(!resolution.config.get_bool(ConfigKey::Clean));
    assert_eq!(resolution.project_path, project_dir.join("App.xcworkspace"));
}

#[test]
fn test_project_detection_failure_is_propagated() {
    struct Missing;
    impl ProjectLoader for Missing {
        fn detect_projects(
            &self,
            _config: &mut RunConfiguration,
            dir: &Path,
        ) -> Result<(), ProjectError> {
            Err(ProjectError::NotFound {
                dir: dir.to_path_buf(),
            })
        }

        fn open(
            &self,
            _config: &RunConfiguration,
            working_dir: &Path,
        ) -> Result<Box<dyn Project>, ProjectError> {
            Err(ProjectError::NotFound {
                dir: working_dir.to_path_buf(),
            })
        }
    }

    let dir = tempdir().expect("tempdir");
    let catalog = FakeCatalog::with_simulators(Vec::new());
    let toolchain = FakeToolchain("14.2");
    let resolver = Resolver::new(&catalog, &toolchain, &Missing);

    let err = resolver
        .resolve(RunConfiguration::new(), dir.path())
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Project(ProjectError::NotFound { .. })
    ));
}
