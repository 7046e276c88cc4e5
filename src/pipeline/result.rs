use super::stage::Stage;
use crate::dockerfile::Dockerfile;
use crate::stack::LanguageId;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Success,
    Failure,
}

/// Category of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ValidationFailure,
    GenerationFailure,
    VerificationFailure,
    InputMissing,
}

impl FailureKind {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Input => FailureKind::InputMissing,
            Stage::Validation => FailureKind::ValidationFailure,
            Stage::Generation => FailureKind::GenerationFailure,
            Stage::Verification => FailureKind::VerificationFailure,
        }
    }
}

/// Final outcome of a run, printed once at the CLI boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub message: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "render_document"
    )]
    pub dockerfile: Option<Dockerfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageId>,
}

fn render_document<S>(document: &Option<Dockerfile>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match document {
        Some(doc) => serializer.serialize_some(&doc.to_string()),
        None => serializer.serialize_none(),
    }
}

impl PipelineResult {
    pub fn success(
        message: impl Into<String>,
        dockerfile: Dockerfile,
        entrypoint: Option<String>,
        language: Option<LanguageId>,
    ) -> Self {
        Self {
            status: PipelineStatus::Success,
            stage: None,
            kind: None,
            message: message.into(),
            dockerfile: Some(dockerfile),
            entrypoint,
            language,
        }
    }

    pub fn failure(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Failure,
            stage: Some(stage),
            kind: Some(FailureKind::for_stage(stage)),
            message: message.into(),
            dockerfile: None,
            entrypoint: None,
            language: None,
        }
    }

    pub fn input_missing(message: impl Into<String>) -> Self {
        Self::failure(Stage::Input, message)
    }

    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.language = Some(language);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            None => writeln!(f, "✓ {}", self.message)?,
            Some(stage) => writeln!(f, "✗ {} failed: {}", stage, self.message)?,
        }
        if let Some(language) = self.language {
            writeln!(f, "  Language:   {}", language)?;
        }
        if let Some(entrypoint) = &self.entrypoint {
            writeln!(f, "  Entrypoint: {}", entrypoint)?;
        }
        if let Some(doc) = &self.dockerfile {
            writeln!(f)?;
            write!(f, "{}", doc)?;
        }
        Ok(())
    }
}
