//! Configuration management for deploychain
//!
//! Settings are loaded from environment variables with defaults. Command-line
//! flags override them.
//!
//! # Environment Variables
//!
//! - `DEPLOYCHAIN_LOG_LEVEL`: Logging level - default: "info"
//! - `DEPLOYCHAIN_MIN_CONFIDENCE`: Entry-point confidence required to generate a
//!   start command - default: "0.7"
//! - `DEPLOYCHAIN_MAX_SOURCE_BYTES`: Largest accepted submission - default: "1048576" (1 MiB)
//! - `DEPLOYCHAIN_WORKDIR`: Working directory inside the image - default: "/app"
//! - `DEPLOYCHAIN_RUN_AS_USER`: User the container runs as - default: "nobody"
//! - `DEPLOYCHAIN_LANGUAGE`: Language assumed when none is given - default: "python"
//!
//! # Example
//!
//! ```
//! use deploychain::DeploychainConfig;
//!
//! let config = DeploychainConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use crate::stack::LanguageId;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1_048_576; // 1 MiB
pub const DEFAULT_WORKDIR: &str = "/app";
pub const DEFAULT_RUN_AS_USER: &str = "nobody";
pub const DEFAULT_LANGUAGE: &str = "python";

const MAX_SOURCE_BYTES_LIMIT: usize = 10_485_760; // 10 MiB

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Language name not recognised
    #[error("Invalid language: {0}")]
    InvalidLanguage(#[from] crate::stack::UnknownLanguage),
}

/// Runtime settings shared by the CLI and the pipeline stages
#[derive(Debug, Clone)]
pub struct DeploychainConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Entry-point confidence in `[0, 1]` below which generation fails
    pub min_confidence: f32,

    /// Maximum submission size in bytes
    pub max_source_bytes: usize,

    /// Absolute working directory inside the image
    pub workdir: String,

    /// Non-root user the final stage switches to
    pub run_as_user: String,

    /// Language assumed when a submission does not declare one
    pub language: String,
}

impl Default for DeploychainConfig {
    /// Loads from `DEPLOYCHAIN_*` environment variables, falling back to defaults
    fn default() -> Self {
        let log_level = env::var("DEPLOYCHAIN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let min_confidence = env::var("DEPLOYCHAIN_MIN_CONFIDENCE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(DEFAULT_MIN_CONFIDENCE);

        let max_source_bytes = env::var("DEPLOYCHAIN_MAX_SOURCE_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_SOURCE_BYTES);

        let workdir =
            env::var("DEPLOYCHAIN_WORKDIR").unwrap_or_else(|_| DEFAULT_WORKDIR.to_string());

        let run_as_user =
            env::var("DEPLOYCHAIN_RUN_AS_USER").unwrap_or_else(|_| DEFAULT_RUN_AS_USER.to_string());

        let language =
            env::var("DEPLOYCHAIN_LANGUAGE").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());

        Self {
            log_level,
            min_confidence,
            max_source_bytes,
            workdir,
            run_as_user,
            language,
        }
    }
}

impl DeploychainConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::ValidationFailed(format!(
                "Minimum confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            )));
        }

        if self.max_source_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max source size must be at least 1 byte".to_string(),
            ));
        }
        if self.max_source_bytes > MAX_SOURCE_BYTES_LIMIT {
            return Err(ConfigError::ValidationFailed(
                "Max source size cannot exceed 10MB".to_string(),
            ));
        }

        if !self.workdir.starts_with('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "Workdir must be an absolute path, got '{}'",
                self.workdir
            )));
        }

        let user = self.run_as_user.split(':').next().unwrap_or_default().trim();
        if user.is_empty() || user == "root" || user == "0" {
            return Err(ConfigError::ValidationFailed(format!(
                "Run-as user must be a non-root user, got '{}'",
                self.run_as_user
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        self.language()?;
        Ok(())
    }

    /// Default language as a typed identifier
    pub fn language(&self) -> Result<LanguageId, ConfigError> {
        Ok(self.language.parse::<LanguageId>()?)
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert(
            "min_confidence".to_string(),
            self.min_confidence.to_string(),
        );
        map.insert(
            "max_source_bytes".to_string(),
            self.max_source_bytes.to_string(),
        );
        map.insert("workdir".to_string(), self.workdir.clone());
        map.insert("run_as_user".to_string(), self.run_as_user.clone());
        map.insert("language".to_string(), self.language.clone());

        map
    }
}

impl fmt::Display for DeploychainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deploychain Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Min Confidence: {}", self.min_confidence)?;
        writeln!(f, "  Max Source Size: {} bytes", self.max_source_bytes)?;
        writeln!(f, "  Workdir: {}", self.workdir)?;
        writeln!(f, "  Run As User: {}", self.run_as_user)?;
        writeln!(f, "  Language: {}", self.language)?;
        Ok(())
    }
}
