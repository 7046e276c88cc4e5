//! Progress handler trait and events

use crate::pipeline::{PipelineState, Stage};
use crate::stack::LanguageId;
use std::time::Duration;

/// Events emitted while a submission moves through the pipeline
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started for a submission
    Started {
        language: LanguageId,
        digest: String,
    },

    /// Coordinator moved between states
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },

    /// Stage started
    StageStarted { stage: Stage },

    /// Stage finished successfully
    StageComplete { stage: Stage, duration: Duration },

    /// Stage rejected the input
    StageFailed {
        stage: Stage,
        message: String,
        duration: Duration,
    },

    /// Every stage succeeded
    Completed { total_time: Duration },

    /// Run ended at a failing stage
    Failed { stage: Stage, total_time: Duration },
}

/// Trait for handling progress events during a pipeline run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
