use runway_core::RunwayError;
use thiserror::Error;

/// Failures raised while routing an invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{tool} can't be called via `runway {tool}`, run '{tool}' directly instead")]
    ToolNotInvocable { tool: String },
    #[error("Could not find lane '{lane}'. Available lanes: {}", list_or_none(.available))]
    UnknownLane {
        lane: String,
        available: Vec<String>,
    },
    #[error("invalid lane parameter '{0}', expected key:value")]
    InvalidParameter(String),
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

impl From<DispatchError> for RunwayError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::ToolNotInvocable { tool } => RunwayError::ToolNotInvocable { tool },
            other => RunwayError::Usage(other.to_string()),
        }
    }
}
