use dirs::config_dir;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CONFIG_DIR_NAME: &str = "runway";
/// Conventional name of the per-project test runner configuration file.
pub const CONFIGURATION_FILE_NAME: &str = "Scanfile";
const SEARCH_SUBDIRECTORIES: [&str; 3] = ["", "runway", ".runway"];

/// Errors raised while reading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// The fixed set of settings a run configuration can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKey {
    Workspace,
    Project,
    Scheme,
    Configuration,
    Sdk,
    Device,
    Devices,
    Destination,
    DerivedDataPath,
    OutputDirectory,
    Clean,
    OnlyTesting,
    SkipTesting,
    Xcargs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 14] = [
        ConfigKey::Workspace,
        ConfigKey::Project,
        ConfigKey::Scheme,
        ConfigKey::Configuration,
        ConfigKey::Sdk,
        ConfigKey::Device,
        ConfigKey::Devices,
        ConfigKey::Destination,
        ConfigKey::DerivedDataPath,
        ConfigKey::OutputDirectory,
        ConfigKey::Clean,
        ConfigKey::OnlyTesting,
        ConfigKey::SkipTesting,
        ConfigKey::Xcargs,
    ];

    /// The snake_case name used in configuration files and summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Workspace => "workspace",
            ConfigKey::Project => "project",
            ConfigKey::Scheme => "scheme",
            ConfigKey::Configuration => "configuration",
            ConfigKey::Sdk => "sdk",
            ConfigKey::Device => "device",
            ConfigKey::Devices => "devices",
            ConfigKey::Destination => "destination",
            ConfigKey::DerivedDataPath => "derived_data_path",
            ConfigKey::OutputDirectory => "output_directory",
            ConfigKey::Clean => "clean",
            ConfigKey::OnlyTesting => "only_testing",
            ConfigKey::SkipTesting => "skip_testing",
            ConfigKey::Xcargs => "xcargs",
        }
    }

    fn is_path(self) -> bool {
        matches!(
            self,
            ConfigKey::Workspace
                | ConfigKey::Project
                | ConfigKey::DerivedDataPath
                | ConfigKey::OutputDirectory
        )
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    List(Vec<String>),
    Bool(bool),
}

impl ConfigValue {
    fn is_empty(&self) -> bool {
        match self {
            ConfigValue::Str(value) => value.trim().is_empty(),
            ConfigValue::List(values) => values.is_empty(),
            ConfigValue::Bool(_) => false,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Str(value) => f.write_str(value),
            ConfigValue::List(values) => write!(f, "{}", values.join(", ")),
            ConfigValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

/// Key-value store for one test run.
///
/// Values are only ever added through [`RunConfiguration::set_if_absent`], so whichever
/// source supplies a key first (command line, then configuration files, then detection)
/// keeps it for the rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfiguration {
    values: BTreeMap<ConfigKey, ConfigValue>,
}

impl RunConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` unless the key already holds a non-empty value.
    ///
    /// Returns `true` when the value was stored. Empty strings and empty lists are never
    /// stored and never count as set.
    pub fn set_if_absent(&mut self, key: ConfigKey, value: impl Into<ConfigValue>) -> bool {
        let value = value.into();
        if value.is_empty() || self.contains(key) {
            return false;
        }
        let value = if key.is_path() {
            expand_path_value(value)
        } else {
            value
        };
        self.values.insert(key, value);
        true
    }

    /// Whether `key` holds a non-empty value.
    pub fn contains(&self, key: ConfigKey) -> bool {
        self.values.get(&key).is_some_and(|value| !value.is_empty())
    }

    pub fn get(&self, key: ConfigKey) -> Option<&ConfigValue> {
        self.values.get(&key)
    }

    /// Returns the value when it is a plain string.
    pub fn get_str(&self, key: ConfigKey) -> Option<&str> {
        match self.values.get(&key) {
            Some(ConfigValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the value as a list; a plain string becomes a single-element list.
    pub fn get_list(&self, key: ConfigKey) -> Option<Vec<String>> {
        match self.values.get(&key) {
            Some(ConfigValue::List(values)) => Some(values.clone()),
            Some(ConfigValue::Str(value)) => Some(vec![value.clone()]),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: ConfigKey) -> bool {
        matches!(self.values.get(&key), Some(ConfigValue::Bool(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigKey, &ConfigValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// Fills absent keys from the TOML configuration file at `path`.
    ///
    /// Returns the keys that were filled.
    pub fn load_configuration_file(&mut self, path: &Path) -> Result<Vec<ConfigKey>, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: ConfigurationFile =
            toml::from_str(&raw).map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        let mut filled = Vec::new();
        for (key, value) in document.into_values() {
            if self.set_if_absent(key, value) {
                filled.push(key);
            }
        }
        debug!(path = %path.display(), filled = filled.len(), "Merged configuration file");
        Ok(filled)
    }

    /// Locates the conventional configuration file under `dir` and merges it.
    ///
    /// Returns the path of the file that was loaded, if any.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
        let Some(path) = find_configuration_file(dir) else {
            return Ok(None);
        };
        self.load_configuration_file(&path)?;
        Ok(Some(path))
    }
}

/// Returns the first existing configuration file below `dir`.
pub fn find_configuration_file(dir: &Path) -> Option<PathBuf> {
    SEARCH_SUBDIRECTORIES
        .iter()
        .map(|sub| {
            if sub.is_empty() {
                dir.join(CONFIGURATION_FILE_NAME)
            } else {
                dir.join(sub).join(CONFIGURATION_FILE_NAME)
            }
        })
        .find(|candidate| candidate.is_file())
}

/// Path to the user-level runway directory (logs live below it).
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

fn expand_path_value(value: ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Str(path) => ConfigValue::Str(shellexpand::tilde(&path).into_owned()),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for ConfigValue {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(value) => ConfigValue::Str(value),
            OneOrMany::Many(values) => ConfigValue::List(values),
        }
    }
}

/// On-disk schema of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigurationFile {
    workspace: Option<String>,
    project: Option<String>,
    scheme: Option<String>,
    configuration: Option<String>,
    sdk: Option<String>,
    device: Option<String>,
    devices: Option<Vec<String>>,
    destination: Option<OneOrMany>,
    derived_data_path: Option<String>,
    output_directory: Option<String>,
    clean: Option<bool>,
    only_testing: Option<OneOrMany>,
    skip_testing: Option<OneOrMany>,
    xcargs: Option<String>,
}

impl ConfigurationFile {
    fn into_values(self) -> Vec<(ConfigKey, ConfigValue)> {
        let mut values: Vec<(ConfigKey, ConfigValue)> = Vec::new();
        let mut push = |key: ConfigKey, value: Option<ConfigValue>| {
            if let Some(value) = value {
                values.push((key, value));
            }
        };
        push(ConfigKey::Workspace, self.workspace.map(Into::into));
        push(ConfigKey::Project, self.project.map(Into::into));
        push(ConfigKey::Scheme, self.scheme.map(Into::into));
        push(ConfigKey::Configuration, self.configuration.map(Into::into));
        push(ConfigKey::Sdk, self.sdk.map(Into::into));
        push(ConfigKey::Device, self.device.map(Into::into));
        push(ConfigKey::Devices, self.devices.map(Into::into));
        push(ConfigKey::Destination, self.destination.map(Into::into));
        push(
            ConfigKey::DerivedDataPath,
            self.derived_data_path.map(Into::into),
        );
        push(
            ConfigKey::OutputDirectory,
            self.output_directory.map(Into::into),
        );
        push(ConfigKey::Clean, self.clean.map(Into::into));
        push(ConfigKey::OnlyTesting, self.only_testing.map(Into::into));
        push(ConfigKey::SkipTesting, self.skip_testing.map(Into::into));
        push(ConfigKey::Xcargs, self.xcargs.map(Into::into));
        values
    }
}
