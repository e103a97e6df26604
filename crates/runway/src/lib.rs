//! The `runway` dispatcher: routes an invocation to a tool or to a lane.

use std::rc::Rc;

pub mod dispatch;
pub mod error;
pub mod lane_command;
pub mod lanes;
pub mod manifest;
pub mod slow_start;
pub mod tools;

pub use dispatch::{Dispatcher, Route, is_version_query, route};
pub use error::DispatchError;
pub use lane_command::{CommandLaneEngine, LaneCommand, LaneEngine};
pub use lanes::{LaneLister, LanefileLister};
pub use manifest::{GemfileProbe, ManifestProbe};
pub use tools::{EntryPointFactory, ToolRegistry, builtin_registry};

/// Dispatcher wired with the shipped registry, lane file reader and manifest probe.
pub fn default_dispatcher() -> Dispatcher {
    let registry = builtin_registry();
    let lanes = Rc::new(LanefileLister::new());
    let default_entry = LaneCommand::new(
        Box::new(lanes.clone()),
        Box::new(CommandLaneEngine),
        registry.names(),
    );
    Dispatcher::new(
        registry,
        Box::new(lanes),
        Box::new(GemfileProbe),
        Box::new(default_entry),
    )
}
