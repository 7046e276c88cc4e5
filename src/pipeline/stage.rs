use super::submission::SourceSubmission;
use crate::dockerfile::Dockerfile;
use crate::generation::GeneratedBuild;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of a pipeline run that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the submission before the pipeline starts (CLI only)
    Input,
    Validation,
    Generation,
    Verification,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Validation => "validation",
            Stage::Generation => "generation",
            Stage::Verification => "verification",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single stage. Produced fresh by each stage and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult<T> {
    Success { message: String, payload: T },
    Failure { message: String },
}

impl<T> StageResult<T> {
    pub fn success(message: impl Into<String>, payload: T) -> Self {
        StageResult::Success {
            message: message.into(),
            payload,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StageResult::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            StageResult::Success { message, .. } | StageResult::Failure { message } => message,
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            StageResult::Success { payload, .. } => Some(payload),
            StageResult::Failure { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            StageResult::Success { payload, .. } => Some(payload),
            StageResult::Failure { .. } => None,
        }
    }
}

impl StageResult<()> {
    pub fn passed(message: impl Into<String>) -> Self {
        Self::success(message, ())
    }
}

/// Checks submitted source text before anything is generated
pub trait SourceValidator: Send + Sync {
    fn validate(&self, submission: &SourceSubmission) -> StageResult<()>;
}

/// Produces a build file for an accepted submission
pub trait BuildFileGenerator: Send + Sync {
    fn generate(&self, submission: &SourceSubmission) -> StageResult<GeneratedBuild>;
}

/// Checks a build file against policy rules
pub trait BuildFileVerifier: Send + Sync {
    fn verify(&self, dockerfile: &Dockerfile) -> StageResult<()>;
}
