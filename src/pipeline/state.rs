use super::stage::Stage;
use serde::Serialize;
use std::fmt;

/// Lifecycle of one pipeline run.
///
/// `Idle -> Validating -> Generating -> Verifying -> Succeeded`, where any
/// running state moves to `Failed(stage)` on failure. Terminal states absorb
/// further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Validating,
    Generating,
    Verifying,
    Succeeded,
    Failed(Stage),
}

impl PipelineState {
    pub fn start(self) -> Self {
        match self {
            PipelineState::Idle => PipelineState::Validating,
            other => other,
        }
    }

    /// Moves past the running stage depending on its outcome
    pub fn advance(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (PipelineState::Validating, true) => PipelineState::Generating,
            (PipelineState::Generating, true) => PipelineState::Verifying,
            (PipelineState::Verifying, true) => PipelineState::Succeeded,
            (running, false) => match running.running_stage() {
                Some(stage) => PipelineState::Failed(stage),
                None => running,
            },
            (other, true) => other,
        }
    }

    /// Stage currently executing, if any
    pub fn running_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Validating => Some(Stage::Validation),
            PipelineState::Generating => Some(Stage::Generation),
            PipelineState::Verifying => Some(Stage::Verification),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Validating => write!(f, "validating"),
            PipelineState::Generating => write!(f, "generating"),
            PipelineState::Verifying => write!(f, "verifying"),
            PipelineState::Succeeded => write!(f, "succeeded"),
            PipelineState::Failed(stage) => write!(f, "failed({})", stage),
        }
    }
}
