use crate::stack::LanguageId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Validate source code, generate a Dockerfile for it and verify the result
#[derive(Parser, Debug)]
#[command(
    name = "deploychain",
    about = "Validate source code, generate a Dockerfile for it and verify the result",
    version,
    author,
    long_about = "deploychain runs submitted source code through three stages: a validator \
                  that rejects malformed or unsafe source, a generator that writes a hardened \
                  Dockerfile for the declared language, and a verifier that checks the \
                  Dockerfile against container policy rules. The outcome is printed as a \
                  single result document."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the validate, generate and verify pipeline",
        long_about = "Runs the full pipeline on one submission. Source is taken from the CODE \
                      argument, from --file, or from standard input when it is piped.\n\n\
                      Examples:\n  \
                      deploychain run \"print('hi')\"\n  \
                      deploychain run --file app.js --language javascript\n  \
                      cat main.go | deploychain run -l go --format dockerfile\n  \
                      deploychain run --file main.py --output-dir build/"
    )]
    Run(RunArgs),

    #[command(
        about = "Verify an existing Dockerfile",
        long_about = "Parses a Dockerfile and checks it against the verification rules.\n\n\
                      Examples:\n  \
                      deploychain verify Dockerfile\n  \
                      cat Dockerfile | deploychain verify --format human"
    )]
    Verify(VerifyArgs),

    #[command(about = "List validation and verification rules")]
    Rules(RulesArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_name = "CODE", help = "Source code to process")]
    pub code: Option<String>,

    #[arg(
        short = 'F',
        long,
        value_name = "PATH",
        conflicts_with = "code",
        help = "Read source code from a file"
    )]
    pub file: Option<PathBuf>,

    #[arg(
        short = 'l',
        long,
        value_parser = parse_language,
        help = "Language of the source (python, javascript, ruby, go); defaults to DEPLOYCHAIN_LANGUAGE or python"
    )]
    pub language: Option<LanguageId>,

    #[arg(long, value_name = "VERSION", help = "Runtime version, e.g. 3.11 or 20")]
    pub runtime_version: Option<String>,

    #[arg(long, value_name = "NAME", help = "File name the source is saved under in the image")]
    pub entry_file: Option<String>,

    #[arg(
        long,
        value_name = "IMAGE",
        help = "Base image to use instead of the runtime default"
    )]
    pub base_image: Option<String>,

    #[arg(
        long,
        value_name = "SCORE",
        help = "Entry-point confidence required to generate a start command (0.0-1.0)"
    )]
    pub min_confidence: Option<f32>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Write the Dockerfile and the source into DIR on success"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Exit with status 2 when the pipeline fails")]
    pub strict: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(
        value_name = "PATH",
        help = "Dockerfile to verify (reads standard input when omitted)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct RulesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Dockerfile,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Dockerfile => super::output::OutputFormat::Dockerfile,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_language(s: &str) -> Result<LanguageId, String> {
    s.parse::<LanguageId>().map_err(|e| e.to_string())
}
