//! The `xcodebuild` invocation for a resolved run.

use std::path::Path;

use runway_core::{ConfigKey, RunConfiguration};

use crate::resolver::Resolution;

const PROGRAM: &str = "xcodebuild";

/// Arguments for `xcodebuild` that build and test the resolved project.
pub fn test_arguments(resolution: &Resolution) -> Vec<String> {
    let config = &resolution.config;
    let mut args = Vec::new();

    let container = if config.contains(ConfigKey::Workspace) {
        "-workspace"
    } else {
        "-project"
    };
    args.push(container.to_string());
    args.push(path_argument(&resolution.project_path));

    if let Some(scheme) = resolution.scheme.as_deref() {
        push_pair(&mut args, "-scheme", scheme);
    }
    push_config_pair(&mut args, config, "-configuration", ConfigKey::Configuration);
    push_config_pair(&mut args, config, "-sdk", ConfigKey::Sdk);
    for destination in resolution.destinations() {
        push_pair(&mut args, "-destination", &destination);
    }
    push_config_pair(&mut args, config, "-derivedDataPath", ConfigKey::DerivedDataPath);

    for identifier in config.get_list(ConfigKey::OnlyTesting).unwrap_or_default() {
        args.push(format!("-only-testing:{identifier}"));
    }
    for identifier in config.get_list(ConfigKey::SkipTesting).unwrap_or_default() {
        args.push(format!("-skip-testing:{identifier}"));
    }
    if let Some(xcargs) = config.get_str(ConfigKey::Xcargs) {
        args.extend(xcargs.split_whitespace().map(str::to_string));
    }

    if config.get_bool(ConfigKey::Clean) {
        args.push("clean".to_string());
    }
    args.push("build".to_string());
    args.push("test".to_string());
    args
}

fn path_argument(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_config_pair(args: &mut Vec<String>, config: &RunConfiguration, flag: &str, key: ConfigKey) {
    if let Some(value) = config.get_str(key) {
        push_pair(args, flag, value);
    }
}

/// Full command line, quoted for a POSIX shell.
pub fn render_command(args: &[String]) -> String {
    std::iter::once(PROGRAM.to_string())
        .chain(args.iter().map(|arg| shell_quote(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
