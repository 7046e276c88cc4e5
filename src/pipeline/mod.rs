//! Validate, generate, verify
//!
//! A [`PipelineOrchestrator`] drives one [`SourceSubmission`] through the three
//! stages, tracking progress with a [`PipelineState`] and returning a single
//! [`PipelineResult`].

pub mod orchestrator;
pub mod result;
pub mod stage;
pub mod state;
pub mod submission;

pub use orchestrator::PipelineOrchestrator;
pub use result::{FailureKind, PipelineResult, PipelineStatus};
pub use stage::{BuildFileGenerator, BuildFileVerifier, SourceValidator, Stage, StageResult};
pub use state::PipelineState;
pub use submission::SourceSubmission;
