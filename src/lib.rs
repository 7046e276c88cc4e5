//! deploychain - validate source code, generate a Dockerfile for it and verify the result
//!
//! A submission (source text plus a declared language) goes through three
//! stages in order. The first failing stage ends the run, and every run ends
//! in exactly one [`PipelineResult`].
//!
//! # Core Concepts
//!
//! - **Validator**: rejects empty, oversized, malformed or secret-bearing source
//! - **Generator**: picks a pinned base image, a dependency step and a start
//!   command for the language, and renders a hardened Dockerfile
//! - **Verifier**: checks the Dockerfile against container policy rules
//!
//! # Example Usage
//!
//! ```
//! use deploychain::{LanguageId, PipelineOrchestrator, SourceSubmission};
//!
//! let orchestrator = PipelineOrchestrator::default();
//! let submission = SourceSubmission::new("print('hello')\n", LanguageId::Python);
//! let result = orchestrator.run(&submission);
//!
//! assert!(result.is_success());
//! let dockerfile = result.dockerfile.unwrap().to_string();
//! assert!(dockerfile.contains("USER nobody"));
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: orchestrator, stage traits, state machine and result document
//! - [`validation`]: source rules and the lexical scanner
//! - [`generation`]: Dockerfile generator
//! - [`verification`]: Dockerfile policy rules
//! - [`dockerfile`]: Dockerfile model, builder and parser
//! - [`stack`]: supported languages and their runtimes

pub mod cli;
pub mod config;
pub mod dockerfile;
pub mod generation;
pub mod pipeline;
pub mod progress;
pub mod stack;
pub mod util;
pub mod validation;
pub mod verification;

pub use config::{ConfigError, DeploychainConfig};
pub use dockerfile::{Dockerfile, DockerfileBuilder, ParseError};
pub use generation::{GenerationError, Generator, GeneratorConfig};
pub use pipeline::{
    FailureKind, PipelineOrchestrator, PipelineResult, PipelineState, PipelineStatus,
    SourceSubmission, Stage, StageResult,
};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use stack::{LanguageId, RuntimeRegistry};
pub use util::{init_logging, LoggingConfig};
pub use validation::Validator;
pub use verification::Verifier;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_deploychain() {
        assert_eq!(NAME, "deploychain");
    }
}
