//! Detection of, and queries against, the Xcode project being tested.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigKey, RunConfiguration};
use crate::platform::Platform;
use crate::process::{ProcessError, run_capture};

const WORKSPACE_EXTENSION: &str = "xcworkspace";
const PROJECT_EXTENSION: &str = "xcodeproj";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("could not find a buildable project or workspace in '{}'", .dir.display())]
    NotFound { dir: PathBuf },
    #[error("found multiple projects ({}); pass --workspace or --project to pick one", format_list(.candidates))]
    Ambiguous { candidates: Vec<String> },
    #[error("project '{}' does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error("couldn't find scheme '{scheme}'; available schemes: {}", .available.join(", "))]
    SchemeNotFound {
        scheme: String,
        available: Vec<String>,
    },
    #[error("multiple schemes found ({}); pass --scheme to pick one", .available.join(", "))]
    MultipleSchemes { available: Vec<String> },
    #[error("'{}' does not contain any shared schemes", .path.display())]
    NoSchemes { path: PathBuf },
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("failed to parse scheme list: {0}")]
    Parse(String),
}

fn format_list(values: &[String]) -> String {
    values.join(", ")
}

/// Handle to a detected project for one resolution pass.
pub trait Project {
    /// Path of the `.xcworkspace` or `.xcodeproj`.
    fn path(&self) -> &Path;

    /// Chooses the active scheme, validating the one requested in `config`.
    fn select_scheme(&mut self, config: &RunConfiguration) -> Result<(), ProjectError>;

    fn scheme(&self) -> Option<&str>;

    fn platform(&self) -> Platform;

    /// Value of a build setting, `None` when unset or unavailable.
    fn build_setting(&self, key: &str) -> Option<String>;
}

/// Finds and opens projects.
pub trait ProjectLoader {
    /// Fills `workspace` or `project` from `dir` when neither is configured.
    fn detect_projects(
        &self,
        config: &mut RunConfiguration,
        dir: &Path,
    ) -> Result<(), ProjectError>;

    /// Opens the configured project; relative paths are taken from `working_dir`.
    fn open(
        &self,
        config: &RunConfiguration,
        working_dir: &Path,
    ) -> Result<Box<dyn Project>, ProjectError>;
}

/// Scans `dir` for workspaces (preferred) and projects and records a single match.
///
/// Leaves the configuration untouched when a workspace or project is already set.
pub fn detect_projects(config: &mut RunConfiguration, dir: &Path) -> Result<(), ProjectError> {
    if config.contains(ConfigKey::Workspace) || config.contains(ConfigKey::Project) {
        return Ok(());
    }

    let workspaces = entries_with_extension(dir, WORKSPACE_EXTENSION);
    let projects = entries_with_extension(dir, PROJECT_EXTENSION);

    let (key, candidates) = if !workspaces.is_empty() {
        (ConfigKey::Workspace, workspaces)
    } else {
        (ConfigKey::Project, projects)
    };

    match candidates.as_slice() {
        [] => Err(ProjectError::NotFound {
            dir: dir.to_path_buf(),
        }),
        [single] => {
            debug!(path = %single.display(), key = %key, "Detected project");
            config.set_if_absent(key, single.to_string_lossy().into_owned());
            Ok(())
        }
        many => Err(ProjectError::Ambiguous {
            candidates: many
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

fn entries_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    paths.sort();
    paths
}

/// Picks the scheme to build.
///
/// A requested scheme must be listed. Without one, a lone scheme is taken; among several,
/// the one named like the project file wins.
pub fn choose_scheme(
    requested: Option<&str>,
    available: &[String],
    project_stem: Option<&str>,
) -> Result<String, ProjectError> {
    if let Some(requested) = requested {
        if available.is_empty() || available.iter().any(|scheme| scheme == requested) {
            return Ok(requested.to_string());
        }
        return Err(ProjectError::SchemeNotFound {
            scheme: requested.to_string(),
            available: available.to_vec(),
        });
    }

    match available {
        [single] => Ok(single.clone()),
        _ => project_stem
            .and_then(|stem| available.iter().find(|scheme| scheme.as_str() == stem))
            .cloned()
            .ok_or_else(|| ProjectError::MultipleSchemes {
                available: available.to_vec(),
            }),
    }
}

/// Parses `KEY = value` lines printed by `xcodebuild -showBuildSettings`.
///
/// When several targets are listed the first value of each key is kept.
pub fn parse_build_settings(raw: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(" = ") else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(' ') {
            continue;
        }
        settings
            .entry(key.to_string())
            .or_insert_with(|| value.trim().to_string());
    }
    settings
}

#[derive(Debug, Deserialize)]
struct SchemeListing {
    #[serde(default)]
    project: Option<SchemeContainer>,
    #[serde(default)]
    workspace: Option<SchemeContainer>,
}

#[derive(Debug, Deserialize)]
struct SchemeContainer {
    #[serde(default)]
    schemes: Vec<String>,
}

/// Parses the JSON printed by `xcodebuild -list -json`.
pub fn parse_scheme_list(raw: &str) -> Result<Vec<String>, ProjectError> {
    let listing: SchemeListing =
        serde_json::from_str(raw).map_err(|err| ProjectError::Parse(err.to_string()))?;
    Ok(listing
        .workspace
        .or(listing.project)
        .map(|container| container.schemes)
        .unwrap_or_default())
}

/// Derives the platform from build settings.
pub fn platform_from_settings(settings: &HashMap<String, String>) -> Platform {
    ["PLATFORM_NAME", "SDKROOT"]
        .iter()
        .filter_map(|key| settings.get(*key))
        .find_map(|value| Platform::from_sdk_name(value))
        .or_else(|| {
            settings
                .get("SUPPORTED_PLATFORMS")
                .and_then(|value| value.split_whitespace().find_map(Platform::from_sdk_name))
        })
        .unwrap_or(Platform::Other)
}

/// Project queried through `xcodebuild`.
#[derive(Debug)]
pub struct XcodeProject {
    path: PathBuf,
    is_workspace: bool,
    configuration: Option<String>,
    scheme: Option<String>,
    build_settings: OnceLock<HashMap<String, String>>,
}

impl XcodeProject {
    pub fn new(config: &RunConfiguration, working_dir: &Path) -> Result<Self, ProjectError> {
        let (raw_path, is_workspace) = match (
            config.get_str(ConfigKey::Workspace),
            config.get_str(ConfigKey::Project),
        ) {
            (Some(workspace), _) => (workspace, true),
            (None, Some(project)) => (project, false),
            (None, None) => {
                return Err(ProjectError::NotFound {
                    dir: working_dir.to_path_buf(),
                });
            }
        };
        let path = working_dir.join(raw_path);
        if !path.exists() {
            return Err(ProjectError::Missing { path });
        }

        Ok(Self {
            path,
            is_workspace,
            configuration: None,
            scheme: None,
            build_settings: OnceLock::new(),
        })
    }

    fn container_args(&self) -> Vec<String> {
        let flag = if self.is_workspace {
            "-workspace"
        } else {
            "-project"
        };
        vec![flag.to_string(), self.path.to_string_lossy().into_owned()]
    }

    fn list_schemes(&self) -> Result<Vec<String>, ProjectError> {
        let mut args = self.container_args();
        args.extend(["-list".to_string(), "-json".to_string()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let raw = run_capture("xcodebuild", &args)?;
        parse_scheme_list(&raw)
    }

    fn settings(&self) -> &HashMap<String, String> {
        self.build_settings.get_or_init(|| {
            let mut args = self.container_args();
            if let Some(scheme) = self.scheme.as_ref() {
                args.extend(["-scheme".to_string(), scheme.clone()]);
            }
            if let Some(configuration) = self.configuration.as_ref() {
                args.extend(["-configuration".to_string(), configuration.clone()]);
            }
            args.push("-showBuildSettings".to_string());
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            match run_capture("xcodebuild", &args) {
                Ok(raw) => parse_build_settings(&raw),
                Err(err) => {
                    warn!(error = %err, "Could not read build settings");
                    HashMap::new()
                }
            }
        })
    }
}

impl Project for XcodeProject {
    fn path(&self) -> &Path {
        &self.path
    }

    fn select_scheme(&mut self, config: &RunConfiguration) -> Result<(), ProjectError> {
        let requested = config.get_str(ConfigKey::Scheme);
        let available = self.list_schemes()?;
        if available.is_empty() && requested.is_none() {
            return Err(ProjectError::NoSchemes {
                path: self.path.clone(),
            });
        }
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        let scheme = choose_scheme(requested, &available, stem.as_deref())?;
        debug!(scheme = %scheme, "Selected scheme");
        self.scheme = Some(scheme);
        self.configuration = config
            .get_str(ConfigKey::Configuration)
            .map(str::to_string);
        Ok(())
    }

    fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    fn platform(&self) -> Platform {
        platform_from_settings(self.settings())
    }

    fn build_setting(&self, key: &str) -> Option<String> {
        self.settings()
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}

/// Loader for real Xcode projects on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcodeProjectLoader;

impl ProjectLoader for XcodeProjectLoader {
    fn detect_projects(
        &self,
        config: &mut RunConfiguration,
        dir: &Path,
    ) -> Result<(), ProjectError> {
        detect_projects(config, dir)
    }

    fn open(
        &self,
        config: &RunConfiguration,
        working_dir: &Path,
    ) -> Result<Box<dyn Project>, ProjectError> {
        Ok(Box::new(XcodeProject::new(config, working_dir)?))
    }
}
