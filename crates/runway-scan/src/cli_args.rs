use clap::{ArgAction, Parser, ValueHint};
use runway_core::{ConfigKey, RunConfiguration};

/// Runs the tests of an Xcode project on a simulator or device.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "scan", version, about, long_about = None, disable_version_flag = true)]
pub struct ScanArgs {
    /// Path to the workspace file.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub workspace: Option<String>,

    /// Path to the project file.
    #[arg(short, long, value_hint = ValueHint::DirPath, conflicts_with = "workspace")]
    pub project: Option<String>,

    /// The project's scheme.
    #[arg(short, long)]
    pub scheme: Option<String>,

    /// The build configuration to use, e.g. Debug.
    #[arg(short = 'q', long)]
    pub configuration: Option<String>,

    /// The SDK to build against.
    #[arg(short = 'k', long)]
    pub sdk: Option<String>,

    /// Name of the simulator or device, optionally with a version, e.g. "iPhone 8 (14.0)".
    #[arg(short = 'a', long, conflicts_with = "devices")]
    pub device: Option<String>,

    /// Comma separated list of devices to test on.
    #[arg(short = 'E', long, value_delimiter = ',')]
    pub devices: Vec<String>,

    /// Explicit -destination value; prefer --device or --devices.
    #[arg(short, long)]
    pub destination: Vec<String>,

    /// Where build products and intermediate files are stored.
    #[arg(short = 'b', long, value_hint = ValueHint::DirPath)]
    pub derived_data_path: Option<String>,

    /// Directory for test reports.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output_directory: Option<String>,

    /// Clean before building.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub clean: bool,

    /// Only run the given test identifiers, e.g. AppTests/LoginTests.
    #[arg(long, value_delimiter = ',', value_name = "IDENTIFIER")]
    pub only_testing: Vec<String>,

    /// Skip the given test identifiers.
    #[arg(long, value_delimiter = ',', value_name = "IDENTIFIER")]
    pub skip_testing: Vec<String>,

    /// Extra arguments passed verbatim to xcodebuild.
    #[arg(short, long)]
    pub xcargs: Option<String>,

    /// Print resolution details.
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,
}

impl ScanArgs {
    /// Seeds a configuration with the flags that were given.
    pub fn to_configuration(&self) -> RunConfiguration {
        let mut config = RunConfiguration::new();
        let strings = [
            (ConfigKey::Workspace, &self.workspace),
            (ConfigKey::Project, &self.project),
            (ConfigKey::Scheme, &self.scheme),
            (ConfigKey::Configuration, &self.configuration),
            (ConfigKey::Sdk, &self.sdk),
            (ConfigKey::Device, &self.device),
            (ConfigKey::DerivedDataPath, &self.derived_data_path),
            (ConfigKey::OutputDirectory, &self.output_directory),
            (ConfigKey::Xcargs, &self.xcargs),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                config.set_if_absent(key, value.as_str());
            }
        }

        let lists = [
            (ConfigKey::Devices, &self.devices),
            (ConfigKey::Destination, &self.destination),
            (ConfigKey::OnlyTesting, &self.only_testing),
            (ConfigKey::SkipTesting, &self.skip_testing),
        ];
        for (key, values) in lists {
            config.set_if_absent(key, values.clone());
        }

        if self.clean {
            config.set_if_absent(ConfigKey::Clean, true);
        }
        config
    }
}
