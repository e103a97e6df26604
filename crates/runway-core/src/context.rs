use std::collections::HashMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Everything an invocation reads from its process: arguments, environment and
/// working directory.
///
/// Inner logic receives this value instead of reading process globals.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    args: Vec<String>,
    env: HashMap<String, String>,
    working_dir: PathBuf,
}

impl InvocationContext {
    pub fn new(
        args: impl IntoIterator<Item = impl Into<String>>,
        env: HashMap<String, String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env,
            working_dir: working_dir.into(),
        }
    }

    /// Captures the current process arguments (without the binary name), environment
    /// and working directory.
    pub fn from_process() -> io::Result<Self> {
        Ok(Self {
            args: env::args().skip(1).collect(),
            env: env::vars().collect(),
            working_dir: env::current_dir()?,
        })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Whether `name` is set to a non-empty value.
    pub fn has_env(&self, name: &str) -> bool {
        self.env_var(name).is_some_and(|value| !value.is_empty())
    }

    /// All environment variables of the invocation.
    pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Same environment and directory, different arguments.
    pub fn with_args(&self, args: Vec<String>) -> Self {
        Self {
            args,
            env: self.env.clone(),
            working_dir: self.working_dir.clone(),
        }
    }
}
