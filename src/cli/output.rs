//! Output formatting for result documents
//!
//! ```
//! use deploychain::cli::output::{OutputFormat, OutputFormatter};
//! use deploychain::pipeline::{PipelineResult, Stage};
//!
//! let result = PipelineResult::failure(Stage::Validation, "[NonEmptySource] Source code is empty");
//! let output = OutputFormatter::new(OutputFormat::Json).format(&result).unwrap();
//! assert!(output.contains("\"kind\": \"validation_failure\""));
//! ```

use crate::config::DeploychainConfig;
use crate::pipeline::{PipelineResult, Stage};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// The generated Dockerfile only; failures fall back to human text
    Dockerfile,
    /// Human-readable formatted text
    Human,
}

/// Name and purpose of one validation or verification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub stage: Stage,
    pub name: &'static str,
    pub description: &'static str,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &PipelineResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize pipeline result to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(result)
                .context("Failed to serialize pipeline result to YAML"),
            OutputFormat::Dockerfile => Ok(match &result.dockerfile {
                Some(doc) => doc.to_string(),
                None => result.to_string(),
            }),
            OutputFormat::Human => Ok(result.to_string()),
        }
    }

    pub fn format_rules(&self, rules: &[RuleInfo]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(rules).context("Failed to serialize rules to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(rules).context("Failed to serialize rules to YAML")
            }
            OutputFormat::Dockerfile | OutputFormat::Human => Ok(self.format_rules_human(rules)),
        }
    }

    fn format_rules_human(&self, rules: &[RuleInfo]) -> String {
        let width = rules.iter().map(|r| r.name.len()).max().unwrap_or(0);
        let mut output = String::new();
        let mut current: Option<Stage> = None;

        for rule in rules {
            if current != Some(rule.stage) {
                if current.is_some() {
                    output.push('\n');
                }
                output.push_str(&format!("{} rules:\n", rule.stage));
                current = Some(rule.stage);
            }
            output.push_str(&format!(
                "  {:width$}  {}\n",
                rule.name,
                rule.description,
                width = width
            ));
        }
        output
    }

    pub fn format_config(&self, config: &DeploychainConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Dockerfile | OutputFormat::Human => Ok(config.to_string()),
        }
    }
}
