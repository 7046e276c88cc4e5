use crate::dockerfile::{find_placeholder, Dockerfile, ImageRef, Instruction};
use anyhow::{bail, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Policy check applied to a Dockerfile document
pub trait VerificationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn check(&self, dockerfile: &Dockerfile) -> Result<()>;
}

pub struct BaseImageRequiredRule;

impl VerificationRule for BaseImageRequiredRule {
    fn name(&self) -> &'static str {
        "BaseImageRequired"
    }

    fn description(&self) -> &'static str {
        "The first instruction after global ARGs must be FROM"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        let first = dockerfile
            .instructions()
            .iter()
            .find(|i| !matches!(i, Instruction::Comment(_) | Instruction::Arg { .. }));

        match first {
            None => bail!("Dockerfile has no FROM instruction"),
            Some(Instruction::From { .. }) => Ok(()),
            Some(other) => bail!(
                "First instruction is {} but a build must start with FROM",
                other.keyword()
            ),
        }
    }
}

pub struct PinnedBaseImageRule;

impl PinnedBaseImageRule {
    /// Substitutes `$NAME` / `${NAME}` with global ARG defaults
    ///
    /// Each reference is matched as a whole identifier, so `$PY_VERSION` never
    /// picks up the default of `PY`.
    fn resolve(image: &ImageRef, args: &HashMap<&str, &str>) -> Option<ImageRef> {
        let text = image.to_string();
        let substituted = arg_reference().replace_all(&text, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match args.get(name) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        });
        ImageRef::parse(&substituted)
            .ok()
            .filter(|resolved| !resolved.is_templated())
    }
}

fn arg_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
    })
}

impl VerificationRule for PinnedBaseImageRule {
    fn name(&self) -> &'static str {
        "PinnedBaseImage"
    }

    fn description(&self) -> &'static str {
        "Base images must name an explicit tag other than 'latest', or a digest"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        let args: HashMap<&str, &str> = dockerfile
            .preamble()
            .iter()
            .filter_map(|i| match i {
                Instruction::Arg {
                    name,
                    default: Some(value),
                } => Some((name.as_str(), value.as_str())),
                _ => None,
            })
            .collect();

        let mut aliases: Vec<&str> = Vec::new();
        for stage in dockerfile.stages() {
            let base = stage.base;
            let is_earlier_stage = base.tag.is_none()
                && base.digest.is_none()
                && aliases.iter().any(|a| a.eq_ignore_ascii_case(&base.name));

            if !base.is_scratch() && !is_earlier_stage {
                let resolved = if base.is_templated() {
                    match Self::resolve(base, &args) {
                        Some(resolved) => resolved,
                        None => bail!(
                            "Base image '{}' depends on a build argument without a default",
                            base
                        ),
                    }
                } else {
                    base.clone()
                };

                if resolved.tag.as_deref() == Some("latest") && resolved.digest.is_none() {
                    bail!("Base image '{}' uses the mutable 'latest' tag", base);
                }
                if !resolved.is_pinned() {
                    bail!("Base image '{}' has no tag or digest", base);
                }
            }

            if let Some(alias) = stage.alias {
                aliases.push(alias);
            }
        }
        Ok(())
    }
}

pub struct WorkdirRequiredRule;

impl VerificationRule for WorkdirRequiredRule {
    fn name(&self) -> &'static str {
        "WorkdirRequired"
    }

    fn description(&self) -> &'static str {
        "The final stage must set WORKDIR"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        match dockerfile.final_stage() {
            Some(stage) if stage.workdir().is_some() => Ok(()),
            _ => bail!("Final stage does not set WORKDIR"),
        }
    }
}

pub struct NonRootUserRule;

impl VerificationRule for NonRootUserRule {
    fn name(&self) -> &'static str {
        "NonRootUser"
    }

    fn description(&self) -> &'static str {
        "The final stage must switch to a non-root USER"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        let user = dockerfile.final_stage().and_then(|stage| stage.user());
        match user {
            None => bail!("Final stage runs as root (no USER instruction)"),
            Some(user) => {
                let name = user.split(':').next().unwrap_or(user).trim();
                if name == "root" || name == "0" {
                    bail!("Final stage switches to root user '{}'", user);
                }
                Ok(())
            }
        }
    }
}

pub struct EntrypointRequiredRule;

impl VerificationRule for EntrypointRequiredRule {
    fn name(&self) -> &'static str {
        "EntrypointRequired"
    }

    fn description(&self) -> &'static str {
        "The final stage must have a non-empty CMD or ENTRYPOINT"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        match dockerfile.final_stage().and_then(|stage| stage.start_command()) {
            None => bail!("Final stage has no CMD or ENTRYPOINT"),
            Some(command) if command.is_empty() => bail!("Start command is empty"),
            Some(_) => Ok(()),
        }
    }
}

pub struct NoPlaceholdersRule;

impl VerificationRule for NoPlaceholdersRule {
    fn name(&self) -> &'static str {
        "NoPlaceholders"
    }

    fn description(&self) -> &'static str {
        "Instructions must not contain unresolved placeholder tokens"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        for instruction in dockerfile.instructions().iter().filter(|i| !i.is_comment()) {
            if let Some(token) = find_placeholder(&instruction.arguments()) {
                bail!(
                    "{} contains placeholder '{}'",
                    instruction.keyword(),
                    token
                );
            }
        }
        Ok(())
    }
}

const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "git@", "ftp://"];

pub struct NoRemoteAddRule;

impl VerificationRule for NoRemoteAddRule {
    fn name(&self) -> &'static str {
        "NoRemoteAdd"
    }

    fn description(&self) -> &'static str {
        "ADD must not fetch remote sources"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        for instruction in dockerfile.instructions() {
            if let Instruction::Add { sources, .. } = instruction {
                if let Some(remote) = sources.iter().find(|s| {
                    let lower = s.to_ascii_lowercase();
                    REMOTE_PREFIXES.iter().any(|p| lower.starts_with(p))
                }) {
                    bail!("ADD fetches remote source '{}'", remote);
                }
            }
        }
        Ok(())
    }
}

fn credential_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(password|passwd|secret|token|api_?key|private_?key|credential)")
            .expect("valid regex")
    })
}

pub struct NoSecretsInEnvRule;

impl VerificationRule for NoSecretsInEnvRule {
    fn name(&self) -> &'static str {
        "NoSecretsInEnv"
    }

    fn description(&self) -> &'static str {
        "ENV and ARG must not carry credentials into the image"
    }

    fn check(&self, dockerfile: &Dockerfile) -> Result<()> {
        for instruction in dockerfile.instructions() {
            let names: Vec<&str> = match instruction {
                Instruction::Env(pairs) => pairs.iter().map(|(k, _)| k.as_str()).collect(),
                Instruction::Arg { name, .. } => vec![name.as_str()],
                _ => continue,
            };
            if let Some(name) = names.into_iter().find(|n| credential_name().is_match(n)) {
                bail!(
                    "{} '{}' looks like a credential",
                    instruction.keyword(),
                    name
                );
            }
        }
        Ok(())
    }
}
