use super::result::PipelineResult;
use super::stage::{BuildFileGenerator, BuildFileVerifier, SourceValidator, Stage, StageResult};
use super::state::PipelineState;
use super::submission::SourceSubmission;
use crate::config::DeploychainConfig;
use crate::generation::{Generator, GeneratorConfig};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::stack::RuntimeRegistry;
use crate::validation::Validator;
use crate::verification::Verifier;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs Validator, Generator and Verifier in order and stops at the first failure
pub struct PipelineOrchestrator {
    validator: Arc<dyn SourceValidator>,
    generator: Arc<dyn BuildFileGenerator>,
    verifier: Arc<dyn BuildFileVerifier>,
    progress_handler: Arc<dyn ProgressHandler>,
}

impl PipelineOrchestrator {
    pub fn new(
        validator: Arc<dyn SourceValidator>,
        generator: Arc<dyn BuildFileGenerator>,
        verifier: Arc<dyn BuildFileVerifier>,
    ) -> Self {
        Self {
            validator,
            generator,
            verifier,
            progress_handler: Arc::new(NoOpHandler),
        }
    }

    /// Default stages configured from `config`
    pub fn from_config(config: &DeploychainConfig, generator_config: GeneratorConfig) -> Self {
        let registry = Arc::new(RuntimeRegistry::with_defaults());
        Self::new(
            Arc::new(Validator::new(registry.clone(), config.max_source_bytes)),
            Arc::new(Generator::new(registry, generator_config)),
            Arc::new(Verifier::new()),
        )
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = handler;
        self
    }

    pub fn run(&self, submission: &SourceSubmission) -> PipelineResult {
        let start = Instant::now();
        let language = submission.language();
        info!(
            language = %language,
            bytes = submission.source().len(),
            "Starting pipeline run"
        );
        self.emit(ProgressEvent::Started {
            language,
            digest: submission.short_digest(),
        });

        let mut state = self.transition(PipelineState::Idle, PipelineState::Idle.start());

        let validation = self.run_stage(Stage::Validation, || self.validator.validate(submission));
        state = self.transition(state, state.advance(validation.is_success()));
        if let StageResult::Failure { message } = validation {
            return self.fail(Stage::Validation, message, start).with_language(language);
        }

        let generation = self.run_stage(Stage::Generation, || self.generator.generate(submission));
        state = self.transition(state, state.advance(generation.is_success()));
        let build = match generation {
            StageResult::Success { payload, .. } => payload,
            StageResult::Failure { message } => {
                return self.fail(Stage::Generation, message, start).with_language(language)
            }
        };

        let verification =
            self.run_stage(Stage::Verification, || self.verifier.verify(&build.dockerfile));
        state = self.transition(state, state.advance(verification.is_success()));
        if let StageResult::Failure { message } = verification {
            return self.fail(Stage::Verification, message, start).with_language(language);
        }

        debug!(state = %state, "Pipeline finished");
        self.emit(ProgressEvent::Completed {
            total_time: start.elapsed(),
        });

        PipelineResult::success(
            "Dockerfile generated and verified",
            build.dockerfile,
            Some(build.entrypoint.file),
            Some(language),
        )
    }

    fn run_stage<T>(&self, stage: Stage, execute: impl FnOnce() -> StageResult<T>) -> StageResult<T> {
        self.emit(ProgressEvent::StageStarted { stage });
        let stage_start = Instant::now();
        let result = execute();
        let duration = stage_start.elapsed();

        match &result {
            StageResult::Success { message, .. } => {
                debug!(stage = %stage, message = %message, "Stage succeeded");
                self.emit(ProgressEvent::StageComplete { stage, duration });
            }
            StageResult::Failure { message } => {
                self.emit(ProgressEvent::StageFailed {
                    stage,
                    message: message.clone(),
                    duration,
                });
            }
        }
        result
    }

    fn transition(&self, from: PipelineState, to: PipelineState) -> PipelineState {
        if from != to {
            self.emit(ProgressEvent::StateChanged { from, to });
        }
        to
    }

    fn fail(&self, stage: Stage, message: String, start: Instant) -> PipelineResult {
        self.emit(ProgressEvent::Failed {
            stage,
            total_time: start.elapsed(),
        });
        PipelineResult::failure(stage, message)
    }

    fn emit(&self, event: ProgressEvent) {
        self.progress_handler.on_progress(&event);
    }
}

impl Default for PipelineOrchestrator {
    fn default() -> Self {
        let registry = Arc::new(RuntimeRegistry::with_defaults());
        Self::new(
            Arc::new(Validator::new(
                registry.clone(),
                crate::config::DEFAULT_MAX_SOURCE_BYTES,
            )),
            Arc::new(Generator::new(registry, GeneratorConfig::default())),
            Arc::new(Verifier::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineStatus;
    use crate::stack::LanguageId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<String>>,
    }

    impl ProgressHandler for RecordingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            let label = match event {
                ProgressEvent::Started { .. } => "started".to_string(),
                ProgressEvent::StateChanged { to, .. } => format!("state:{}", to),
                ProgressEvent::StageStarted { stage } => format!("start:{}", stage),
                ProgressEvent::StageComplete { stage, .. } => format!("done:{}", stage),
                ProgressEvent::StageFailed { stage, .. } => format!("fail:{}", stage),
                ProgressEvent::Completed { .. } => "completed".to_string(),
                ProgressEvent::Failed { stage, .. } => format!("failed:{}", stage),
            };
            self.events.lock().unwrap().push(label);
        }
    }

    #[test]
    fn test_successful_run_event_sequence() {
        let handler = Arc::new(RecordingHandler::default());
        let orchestrator = PipelineOrchestrator::default().with_progress(handler.clone());

        let result = orchestrator.run(&SourceSubmission::new("print('hi')\n", LanguageId::Python));
        assert_eq!(result.status, PipelineStatus::Success);

        let events = handler.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "started",
                "state:validating",
                "start:validation",
                "done:validation",
                "state:generating",
                "start:generation",
                "done:generation",
                "state:verifying",
                "start:verification",
                "done:verification",
                "state:succeeded",
                "completed",
            ]
        );
    }

    #[test]
    fn test_failed_run_stops_events_at_failing_stage() {
        let handler = Arc::new(RecordingHandler::default());
        let orchestrator = PipelineOrchestrator::default().with_progress(handler.clone());

        let result = orchestrator.run(&SourceSubmission::new("print('hi'\n", LanguageId::Python));
        assert_eq!(result.stage, Some(Stage::Validation));
        assert_eq!(result.language, Some(LanguageId::Python));

        let events = handler.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "started",
                "state:validating",
                "start:validation",
                "fail:validation",
                "state:failed(validation)",
                "failed:validation",
            ]
        );
    }

    #[test]
    fn test_from_config_applies_limits() {
        let config = DeploychainConfig {
            max_source_bytes: 4,
            ..DeploychainConfig::default()
        };
        let orchestrator = PipelineOrchestrator::from_config(&config, GeneratorConfig::default());
        let result = orchestrator.run(&SourceSubmission::new("print('hi')\n", LanguageId::Python));
        assert_eq!(result.stage, Some(Stage::Validation));
        assert!(result.message.starts_with("[SourceSize]"));
    }
}
