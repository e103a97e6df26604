//! Default entry point: lists lanes and tools, or runs a lane.

use std::process::Command;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use runway_core::{CommandEntryPoint, InvocationContext, RunwayError, ui};
use tracing::info;

use crate::error::DispatchError;
use crate::lanes::LaneLister;

/// Environment variable naming the program that executes lanes.
pub const LANE_ENGINE_VAR: &str = "RUNWAY_LANE_ENGINE";

#[derive(Parser, Debug, Clone)]
#[command(name = "runway", version, about, long_about = None, disable_version_flag = true)]
struct LaneCli {
    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Option<LaneSubcommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum LaneSubcommand {
    /// List the lanes defined in the lane file.
    Lanes,
    /// List the tools `runway` knows.
    Tools,
    /// Run a lane with optional key:value parameters.
    #[command(external_subcommand)]
    Lane(Vec<String>),
}

/// Runs a lane on behalf of the default entry point.
pub trait LaneEngine {
    fn run_lane(
        &self,
        lane: &str,
        parameters: &[(String, String)],
        ctx: &InvocationContext,
    ) -> Result<(), RunwayError>;
}

/// Engine that launches the program named by `RUNWAY_LANE_ENGINE`.
///
/// The program receives the lane name followed by each parameter as `key:value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLaneEngine;

impl LaneEngine for CommandLaneEngine {
    fn run_lane(
        &self,
        lane: &str,
        parameters: &[(String, String)],
        ctx: &InvocationContext,
    ) -> Result<(), RunwayError> {
        let Some(program) = ctx.env_var(LANE_ENGINE_VAR).filter(|value| !value.is_empty()) else {
            return Err(RunwayError::environment(format!(
                "No lane engine configured; set {LANE_ENGINE_VAR} to run lane '{lane}'"
            )));
        };

        ui::message(format!("Driving the lane '{lane}'"));
        let status = Command::new(program)
            .arg(lane)
            .args(parameters.iter().map(|(key, value)| format!("{key}:{value}")))
            .current_dir(ctx.working_dir())
            .envs(ctx.env_pairs())
            .status()?;

        if status.success() {
            ui::success(format!("Lane '{lane}' finished successfully"));
            Ok(())
        } else {
            Err(RunwayError::LaneFailed {
                lane: lane.to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// The entry point used when no tool name is given.
pub struct LaneCommand {
    lanes: Box<dyn LaneLister>,
    engine: Box<dyn LaneEngine>,
    tools: Vec<&'static str>,
}

impl LaneCommand {
    pub fn new(
        lanes: Box<dyn LaneLister>,
        engine: Box<dyn LaneEngine>,
        tools: Vec<&'static str>,
    ) -> Self {
        Self {
            lanes,
            engine,
            tools,
        }
    }

    fn list_lanes(&self, ctx: &InvocationContext) {
        let lanes: Vec<String> = self
            .lanes
            .available_lanes(ctx.working_dir())
            .into_iter()
            .collect();
        if lanes.is_empty() {
            ui::important("No lanes found. Define one with `lane :name do` in your Lanefile");
        } else {
            ui::message("Available lanes:");
            for lane in &lanes {
                println!("{lane}");
            }
        }
    }

    fn run(&self, words: &[String], ctx: &InvocationContext) -> Result<(), RunwayError> {
        let Some((lane, rest)) = words.split_first() else {
            self.list_lanes(ctx);
            return Ok(());
        };

        let available = self.lanes.available_lanes(ctx.working_dir());
        if !available.contains(lane) {
            return Err(DispatchError::UnknownLane {
                lane: lane.clone(),
                available: available.into_iter().collect(),
            }
            .into());
        }

        let parameters = parse_parameters(rest)?;
        info!(lane = %lane, parameters = parameters.len(), "Running lane");
        self.engine.run_lane(lane, &parameters, ctx)
    }
}

impl CommandEntryPoint for LaneCommand {
    fn name(&self) -> &'static str {
        "runway"
    }

    fn start(&self, ctx: &InvocationContext) -> Result<(), RunwayError> {
        let argv = std::iter::once("runway".to_string()).chain(ctx.args().iter().cloned());
        let cli = match LaneCli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.print()?;
                return Ok(());
            }
            Err(err) => return Err(RunwayError::Usage(err.render().to_string())),
        };

        match cli.command {
            None | Some(LaneSubcommand::Lanes) => {
                self.list_lanes(ctx);
                Ok(())
            }
            Some(LaneSubcommand::Tools) => {
                for tool in &self.tools {
                    println!("{tool}");
                }
                Ok(())
            }
            Some(LaneSubcommand::Lane(words)) => self.run(&words, ctx),
        }
    }
}

/// Splits `key:value` words at the first colon.
pub fn parse_parameters(words: &[String]) -> Result<Vec<(String, String)>, DispatchError> {
    words
        .iter()
        .map(|word| match word.split_once(':') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(DispatchError::InvalidParameter(word.clone())),
        })
        .collect()
}
