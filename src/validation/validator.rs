use super::rules::{
    BalancedDelimitersRule, ConflictMarkersRule, ConsistentIndentationRule, HardcodedSecretRule,
    NonEmptySourceRule, SourceRule, SourceSizeRule, TextEncodingRule,
};
use crate::config::DEFAULT_MAX_SOURCE_BYTES;
use crate::pipeline::{SourceSubmission, SourceValidator, StageResult};
use crate::stack::RuntimeRegistry;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Runs the source rules in order and stops at the first violation
pub struct Validator {
    registry: Arc<RuntimeRegistry>,
    rules: Vec<Box<dyn SourceRule>>,
}

impl Validator {
    pub fn new(registry: Arc<RuntimeRegistry>, max_source_bytes: usize) -> Self {
        Self::with_rules(registry, default_rules(max_source_bytes))
    }

    pub fn with_rules(registry: Arc<RuntimeRegistry>, rules: Vec<Box<dyn SourceRule>>) -> Self {
        Self { registry, rules }
    }

    pub fn rules(&self) -> &[Box<dyn SourceRule>] {
        &self.rules
    }

    fn check(&self, submission: &SourceSubmission) -> Result<()> {
        let language = submission.language();
        let Some(runtime) = self.registry.get(language) else {
            anyhow::bail!("[SupportedLanguage] No runtime registered for {}", language);
        };

        for rule in &self.rules {
            debug!(rule = rule.name(), "Checking source rule");
            if let Err(e) = rule.check(submission.source(), runtime) {
                anyhow::bail!("[{}] {}", rule.name(), e);
            }
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(
            Arc::new(RuntimeRegistry::with_defaults()),
            DEFAULT_MAX_SOURCE_BYTES,
        )
    }
}

impl SourceValidator for Validator {
    fn validate(&self, submission: &SourceSubmission) -> StageResult<()> {
        match self.check(submission) {
            Ok(()) => StageResult::passed(format!(
                "Source passed {} checks",
                self.rules.len()
            )),
            Err(e) => StageResult::failure(e.to_string()),
        }
    }
}

pub fn default_rules(max_source_bytes: usize) -> Vec<Box<dyn SourceRule>> {
    vec![
        Box::new(NonEmptySourceRule),
        Box::new(SourceSizeRule {
            max_bytes: max_source_bytes,
        }),
        Box::new(TextEncodingRule),
        Box::new(ConflictMarkersRule),
        Box::new(BalancedDelimitersRule),
        Box::new(ConsistentIndentationRule),
        Box::new(HardcodedSecretRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::LanguageId;

    fn python(source: &str) -> SourceSubmission {
        SourceSubmission::new(source, LanguageId::Python)
    }

    #[test]
    fn test_validator_accepts_simple_program() {
        let result = Validator::default().validate(&python("print('hi')\n"));
        assert!(result.is_success());
        assert_eq!(result.message(), "Source passed 7 checks");
    }

    #[test]
    fn test_validator_reports_rule_name() {
        let result = Validator::default().validate(&python("<<<<<<< HEAD\nprint('a')\n"));
        assert!(!result.is_success());
        assert!(result.message().starts_with("[ConflictMarkers] "));
    }

    #[test]
    fn test_validator_stops_at_first_rule() {
        let result = Validator::default().validate(&python(""));
        assert_eq!(result.message(), "[NonEmptySource] Source code is empty");
    }

    #[test]
    fn test_validator_size_limit() {
        let validator = Validator::new(Arc::new(RuntimeRegistry::with_defaults()), 4);
        let result = validator.validate(&python("print('hi')"));
        assert_eq!(
            result.message(),
            "[SourceSize] Source is 11 bytes, the limit is 4 bytes"
        );
    }

    #[test]
    fn test_validator_without_runtime() {
        let validator = Validator::new(Arc::new(RuntimeRegistry::new()), 1024);
        let result = validator.validate(&python("print('hi')"));
        assert_eq!(
            result.message(),
            "[SupportedLanguage] No runtime registered for Python"
        );
    }

    #[test]
    fn test_validator_with_custom_rules() {
        let validator =
            Validator::with_rules(Arc::new(RuntimeRegistry::with_defaults()), vec![]);
        assert!(validator.validate(&python("")).is_success());
        assert!(validator.rules().is_empty());
    }

    #[test]
    fn test_default_rule_order() {
        let names: Vec<_> = default_rules(1024).iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "NonEmptySource",
                "SourceSize",
                "TextEncoding",
                "ConflictMarkers",
                "BalancedDelimiters",
                "ConsistentIndentation",
                "HardcodedSecret",
            ]
        );
    }
}
