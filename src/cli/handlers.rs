use super::commands::{ConfigArgs, RulesArgs, RunArgs, VerifyArgs};
use super::output::{OutputFormatter, RuleInfo};
use crate::config::{DeploychainConfig, DEFAULT_MAX_SOURCE_BYTES};
use crate::dockerfile::Dockerfile;
use crate::generation::GeneratorConfig;
use crate::pipeline::{
    BuildFileVerifier, PipelineOrchestrator, PipelineResult, SourceSubmission, Stage, StageResult,
};
use crate::progress::LoggingHandler;
use crate::validation::default_rules;
use crate::verification::Verifier;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_FAILED: i32 = 2;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("No source code provided: pass CODE, --file, or pipe it on standard input")]
    Missing,

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] io::Error),
}

/// Reads the submission from the inline argument, a file, or piped stdin
///
/// Whitespace-only stdin counts as no input at all.
pub fn read_source(code: Option<&str>, file: Option<&Path>) -> Result<String, InputError> {
    if let Some(code) = code {
        return Ok(code.to_string());
    }

    if let Some(path) = file {
        return std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        });
    }

    if atty::is(atty::Stream::Stdin) {
        return Err(InputError::Missing);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(InputError::Stdin)?;
    if buffer.trim().is_empty() {
        return Err(InputError::Missing);
    }
    Ok(buffer)
}

pub fn handle_run(args: &RunArgs, quiet: bool) -> i32 {
    info!("Starting deploychain run");

    let default_config = DeploychainConfig::default();
    let config = DeploychainConfig {
        min_confidence: args.min_confidence.unwrap_or(default_config.min_confidence),
        ..default_config
    };
    if args.min_confidence.is_some() {
        debug!("Minimum confidence overridden to: {}", config.min_confidence);
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return EXIT_ERROR;
    }

    let language = match args.language {
        Some(language) => language,
        None => match config.language() {
            Ok(language) => language,
            Err(e) => {
                error!("Configuration error: {}", e);
                return EXIT_ERROR;
            }
        },
    };
    debug!("Language: {}", language);

    let formatter = OutputFormatter::new(args.format.into());

    let source = match read_source(args.code.as_deref(), args.file.as_deref()) {
        Ok(source) => source,
        Err(InputError::Missing) => {
            let result = PipelineResult::input_missing(InputError::Missing.to_string());
            print_result(&formatter, &result);
            return EXIT_ERROR;
        }
        Err(e) => {
            error!("{}", e);
            return EXIT_ERROR;
        }
    };

    let mut submission = SourceSubmission::new(source, language);
    if let Some(version) = &args.runtime_version {
        submission = submission.with_runtime_version(version.clone());
    }
    if let Some(entry_file) = &args.entry_file {
        submission = submission.with_entry_file(entry_file.clone());
    }

    let generator_config = GeneratorConfig {
        base_image_override: args.base_image.clone(),
        ..GeneratorConfig::from(&config)
    };
    if let Some(image) = &generator_config.base_image_override {
        debug!("Base image overridden to: {}", image);
    }

    let orchestrator = PipelineOrchestrator::from_config(&config, generator_config)
        .with_progress(Arc::new(LoggingHandler));
    let result = orchestrator.run(&submission);

    if !print_result(&formatter, &result) {
        return EXIT_ERROR;
    }

    if result.is_success() {
        if let Some(dir) = &args.output_dir {
            match write_build_context(dir, &submission, &result) {
                Ok(()) => {
                    if !quiet {
                        eprintln!("Output written to: {}", dir.display());
                    }
                }
                Err(e) => {
                    error!("Failed to write output: {:#}", e);
                    return EXIT_ERROR;
                }
            }
        }
        return EXIT_OK;
    }

    if args.strict {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

pub fn handle_verify(args: &VerifyArgs) -> i32 {
    let text = match &args.path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.clone(),
            source,
        }),
        None => read_source(None, None),
    };
    let text = match text {
        Ok(text) => text,
        Err(e) => {
            error!("{}", e);
            return EXIT_ERROR;
        }
    };

    let result = verify_document(&text, &Verifier::new());
    let formatter = OutputFormatter::new(args.format.into());
    if !print_result(&formatter, &result) {
        return EXIT_ERROR;
    }

    if result.is_success() {
        EXIT_OK
    } else {
        EXIT_FAILED
    }
}

pub fn handle_rules(args: &RulesArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_rules(&collect_rules()) {
        Ok(output) => {
            println!("{}", output.trim_end());
            EXIT_OK
        }
        Err(e) => {
            error!("Failed to format rules: {:#}", e);
            EXIT_ERROR
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = DeploychainConfig::default();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return EXIT_ERROR;
    }

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_config(&config) {
        Ok(output) => {
            println!("{}", output.trim_end());
            EXIT_OK
        }
        Err(e) => {
            error!("Failed to format configuration: {:#}", e);
            EXIT_ERROR
        }
    }
}

fn verify_document(text: &str, verifier: &dyn BuildFileVerifier) -> PipelineResult {
    let dockerfile = match Dockerfile::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            return PipelineResult::failure(
                Stage::Verification,
                format!("Failed to parse Dockerfile: {}", e),
            )
        }
    };

    match verifier.verify(&dockerfile) {
        StageResult::Success { message, .. } => {
            PipelineResult::success(message, dockerfile, None, None)
        }
        StageResult::Failure { message } => PipelineResult::failure(Stage::Verification, message),
    }
}

fn collect_rules() -> Vec<RuleInfo> {
    let validation = default_rules(DEFAULT_MAX_SOURCE_BYTES)
        .into_iter()
        .map(|rule| RuleInfo {
            stage: Stage::Validation,
            name: rule.name(),
            description: rule.description(),
        });
    let verifier = Verifier::new();
    let verification = verifier.rules().iter().map(|rule| RuleInfo {
        stage: Stage::Verification,
        name: rule.name(),
        description: rule.description(),
    });
    validation.chain(verification).collect()
}

fn print_result(formatter: &OutputFormatter, result: &PipelineResult) -> bool {
    match formatter.format(result) {
        Ok(output) => {
            println!("{}", output.trim_end());
            true
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            false
        }
    }
}

/// Writes `Dockerfile` and the submitted source under its entry file name
fn write_build_context(
    dir: &Path,
    submission: &SourceSubmission,
    result: &PipelineResult,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let dockerfile = result
        .dockerfile
        .as_ref()
        .context("Result carries no Dockerfile")?;
    let entry_file = result
        .entrypoint
        .as_deref()
        .context("Result carries no entry point")?;

    let source_path = dir.join(entry_file);
    if let Some(parent) = source_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let dockerfile_path = dir.join("Dockerfile");
    std::fs::write(&dockerfile_path, dockerfile.to_string())
        .with_context(|| format!("Failed to write {}", dockerfile_path.display()))?;
    std::fs::write(&source_path, submission.source())
        .with_context(|| format!("Failed to write {}", source_path.display()))?;
    Ok(())
}
