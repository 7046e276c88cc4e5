//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { language, digest } => {
                info!(language = %language, digest = %digest, "Starting pipeline");
            }
            ProgressEvent::StateChanged { from, to } => {
                debug!(from = %from, to = %to, "State changed");
            }
            ProgressEvent::StageStarted { stage } => {
                info!(stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete { stage, duration } => {
                info!(
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::StageFailed {
                stage,
                message,
                duration,
            } => {
                warn!(
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    reason = %message,
                    "Stage failed"
                );
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Pipeline complete");
            }
            ProgressEvent::Failed { stage, total_time } => {
                warn!(
                    stage = %stage,
                    total_time_ms = total_time.as_millis(),
                    "Pipeline failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineState, Stage};
    use crate::stack::LanguageId;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::Started {
                language: LanguageId::Go,
                digest: "deadbeef".to_string(),
            },
            ProgressEvent::StateChanged {
                from: PipelineState::Idle,
                to: PipelineState::Validating,
            },
            ProgressEvent::StageStarted {
                stage: Stage::Validation,
            },
            ProgressEvent::StageComplete {
                stage: Stage::Validation,
                duration: Duration::from_millis(1),
            },
            ProgressEvent::StageFailed {
                stage: Stage::Generation,
                message: "No concrete entry point".to_string(),
                duration: Duration::from_millis(1),
            },
            ProgressEvent::Completed {
                total_time: Duration::from_millis(3),
            },
            ProgressEvent::Failed {
                stage: Stage::Verification,
                total_time: Duration::from_millis(3),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
