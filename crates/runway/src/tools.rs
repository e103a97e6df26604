//! Static table of the tools `runway` knows by name.

use std::collections::BTreeMap;

use runway_core::CommandEntryPoint;
use runway_scan::ScanCommand;

use crate::error::DispatchError;

/// Builds a tool's command entry point.
pub type EntryPointFactory = Box<dyn Fn() -> Box<dyn CommandEntryPoint>>;

/// Known tool names, each with an entry point when the tool can be run as
/// `runway <tool>`.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Option<EntryPointFactory>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` without an entry point.
    pub fn register_known(&mut self, name: &'static str) {
        self.tools.insert(name, None);
    }

    pub fn register<F>(&mut self, name: &'static str, factory: F)
    where
        F: Fn() -> Box<dyn CommandEntryPoint> + 'static,
    {
        let factory: EntryPointFactory = Box::new(factory);
        self.tools.insert(name, Some(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Builds the entry point for `name`.
    ///
    /// Fails with [`DispatchError::ToolNotInvocable`] when the tool is unknown or has no
    /// entry point.
    pub fn load(&self, name: &str) -> Result<Box<dyn CommandEntryPoint>, DispatchError> {
        match self.tools.get(name) {
            Some(Some(factory)) => Ok(factory()),
            _ => Err(DispatchError::ToolNotInvocable {
                tool: name.to_string(),
            }),
        }
    }
}

const KNOWN_TOOLS: [&str; 6] = ["scan", "gym", "snapshot", "sigh", "deliver", "pilot"];

/// The registry shipped with `runway`.
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in KNOWN_TOOLS {
        registry.register_known(name);
    }
    registry.register(runway_scan::TOOL_NAME, || Box::new(ScanCommand::new()));
    registry
}
