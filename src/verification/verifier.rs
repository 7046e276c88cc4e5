use super::rules::{
    BaseImageRequiredRule, EntrypointRequiredRule, NoPlaceholdersRule, NoRemoteAddRule,
    NoSecretsInEnvRule, NonRootUserRule, PinnedBaseImageRule, VerificationRule,
    WorkdirRequiredRule,
};
use crate::dockerfile::Dockerfile;
use crate::pipeline::{BuildFileVerifier, StageResult};
use anyhow::Result;
use tracing::debug;

/// Runs the verification rules in order and stops at the first violation
pub struct Verifier {
    rules: Vec<Box<dyn VerificationRule>>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn VerificationRule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn VerificationRule>] {
        &self.rules
    }

    pub fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        for rule in &self.rules {
            debug!(rule = rule.name(), "Checking Dockerfile rule");
            if let Err(e) = rule.check(dockerfile) {
                anyhow::bail!("[{}] {}", rule.name(), e);
            }
        }
        Ok(())
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(BaseImageRequiredRule),
                Box::new(PinnedBaseImageRule),
                Box::new(WorkdirRequiredRule),
                Box::new(NonRootUserRule),
                Box::new(EntrypointRequiredRule),
                Box::new(NoPlaceholdersRule),
                Box::new(NoRemoteAddRule),
                Box::new(NoSecretsInEnvRule),
            ],
        }
    }
}

impl BuildFileVerifier for Verifier {
    fn verify(&self, dockerfile: &Dockerfile) -> StageResult<()> {
        match self.check(dockerfile) {
            Ok(()) => StageResult::passed(format!(
                "Dockerfile passed {} checks",
                self.rules.len()
            )),
            Err(e) => StageResult::failure(e.to_string()),
        }
    }
}
