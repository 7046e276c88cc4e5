use crate::config::DeploychainConfig;
use crate::dockerfile::{Command, Dockerfile, DockerfileBuilder, DocumentError, ImageRef, ImageRefError};
use crate::pipeline::{BuildFileGenerator, SourceSubmission, StageResult};
use crate::stack::{LanguageId, Runtime, RuntimeRegistry};
use serde::Serialize;
use std::path::{Component, Path};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Minimum entry-point confidence required to emit a start command
    pub min_confidence: f32,
    pub workdir: String,
    pub run_as_user: String,
    /// Used verbatim instead of the runtime's pinned image
    pub base_image_override: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_confidence: crate::config::DEFAULT_MIN_CONFIDENCE,
            workdir: crate::config::DEFAULT_WORKDIR.to_string(),
            run_as_user: crate::config::DEFAULT_RUN_AS_USER.to_string(),
            base_image_override: None,
        }
    }
}

impl From<&DeploychainConfig> for GeneratorConfig {
    fn from(config: &DeploychainConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            workdir: config.workdir.clone(),
            run_as_user: config.run_as_user.clone(),
            base_image_override: None,
        }
    }
}

/// Resolved way of starting the submitted program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entrypoint {
    pub file: String,
    pub command: Vec<String>,
    pub confidence: f32,
    pub reason: String,
}

/// Generator payload: the validated document and how it starts the program
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBuild {
    pub dockerfile: Dockerfile,
    pub entrypoint: Entrypoint,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No runtime registered for {0}")]
    UnsupportedLanguage(LanguageId),

    #[error("Entry file '{0}' must be a relative path inside the build context")]
    InvalidEntryFile(String),

    #[error("Entry file '{file}' does not match {language} (expected extension: {expected})")]
    EntryFileExtension {
        file: String,
        language: LanguageId,
        expected: String,
    },

    #[error("No concrete entry point: {reason} (confidence {confidence:.2} is below {threshold:.2})")]
    LowConfidence {
        confidence: f32,
        threshold: f32,
        reason: String,
    },

    #[error("Invalid base image: {0}")]
    BaseImage(#[from] ImageRefError),

    #[error("Generated document rejected: {0}")]
    Document(#[from] DocumentError),
}

/// Builds a single-stage Dockerfile from a submission and its declared runtime
pub struct Generator {
    registry: Arc<RuntimeRegistry>,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(registry: Arc<RuntimeRegistry>, config: GeneratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn build(&self, submission: &SourceSubmission) -> Result<GeneratedBuild, GenerationError> {
        let language = submission.language();
        let runtime = self
            .registry
            .get(language)
            .ok_or(GenerationError::UnsupportedLanguage(language))?;

        let entrypoint = self.resolve_entrypoint(runtime, submission)?;
        debug!(
            file = %entrypoint.file,
            confidence = entrypoint.confidence,
            "Resolved entry point"
        );

        let image = match &self.config.base_image_override {
            Some(image) => ImageRef::parse(image)?,
            None => ImageRef::parse(&runtime.base_image(submission.runtime_version()))?,
        };

        let mut builder = DockerfileBuilder::new()
            .comment(format!(
                "Generated by deploychain for {} ({})",
                language, entrypoint.file
            ))
            .from(image)
            .workdir(&self.config.workdir)
            .copy(".", &self.config.workdir)
            .run(runtime.install_command());

        for step in runtime.build_commands(&entrypoint.file) {
            builder = builder.run(step);
        }

        let dockerfile = builder
            .user(&self.config.run_as_user)
            .cmd(Command::Exec(entrypoint.command.clone()))
            .build()?;

        info!(
            language = %language,
            entrypoint = %entrypoint.file,
            "Generated Dockerfile"
        );

        Ok(GeneratedBuild {
            dockerfile,
            entrypoint,
        })
    }

    fn resolve_entrypoint(
        &self,
        runtime: &dyn Runtime,
        submission: &SourceSubmission,
    ) -> Result<Entrypoint, GenerationError> {
        let file = match submission.entry_file() {
            Some(declared) => {
                check_entry_file(runtime, declared)?;
                declared.to_string()
            }
            None => runtime.entry_file_for(submission.source()).to_string(),
        };

        let evidence = runtime.entrypoint_evidence(submission.source());
        if evidence.confidence < self.config.min_confidence {
            return Err(GenerationError::LowConfidence {
                confidence: evidence.confidence,
                threshold: self.config.min_confidence,
                reason: evidence.reason,
            });
        }

        Ok(Entrypoint {
            command: runtime.start_command(&file),
            file,
            confidence: evidence.confidence,
            reason: evidence.reason,
        })
    }
}

fn check_entry_file(runtime: &dyn Runtime, declared: &str) -> Result<(), GenerationError> {
    let path = Path::new(declared);
    let relative = !declared.trim().is_empty()
        && !declared.chars().any(char::is_whitespace)
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !relative {
        return Err(GenerationError::InvalidEntryFile(declared.to_string()));
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !runtime.extensions().contains(&extension) {
        return Err(GenerationError::EntryFileExtension {
            file: declared.to_string(),
            language: runtime.language(),
            expected: runtime
                .extensions()
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(())
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(
            Arc::new(RuntimeRegistry::with_defaults()),
            GeneratorConfig::default(),
        )
    }
}

impl BuildFileGenerator for Generator {
    fn generate(&self, submission: &SourceSubmission) -> StageResult<GeneratedBuild> {
        match self.build(submission) {
            Ok(build) => StageResult::success(
                format!(
                    "Generated Dockerfile for {} starting {}",
                    submission.language(),
                    build.entrypoint.file
                ),
                build,
            ),
            Err(e) => StageResult::failure(e.to_string()),
        }
    }
}
