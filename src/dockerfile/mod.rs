//! Dockerfile document model
//!
//! A [`Dockerfile`] is an ordered list of typed [`Instruction`]s. Generated
//! documents come from [`DockerfileBuilder`], which refuses to produce a
//! document without a base image, working directory or start command.
//! Existing files are read with [`Dockerfile::parse`]. Text is only produced at
//! the boundary through `Display`.

pub mod builder;
pub mod image;
pub mod instruction;
pub mod parser;

pub use builder::{DockerfileBuilder, DocumentError};
pub use image::{ImageRef, ImageRefError};
pub use instruction::{Command, Instruction};
pub use parser::ParseError;

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dockerfile {
    instructions: Vec<Instruction>,
}

/// One build stage: a FROM instruction and everything up to the next FROM
#[derive(Debug, Clone, Copy)]
pub struct Stage<'a> {
    pub index: usize,
    pub base: &'a ImageRef,
    pub alias: Option<&'a str>,
    pub instructions: &'a [Instruction],
}

impl<'a> Stage<'a> {
    pub fn workdir(&self) -> Option<&'a str> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::Workdir(path) => Some(path.as_str()),
            _ => None,
        })
    }

    /// Effective user: the last USER instruction of the stage
    pub fn user(&self) -> Option<&'a str> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::User(user) => Some(user.as_str()),
            _ => None,
        })
    }

    /// Last CMD or ENTRYPOINT, whichever comes later
    pub fn start_command(&self) -> Option<&'a Command> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::Cmd(command) | Instruction::Entrypoint(command) => Some(command),
            _ => None,
        })
    }
}

impl Dockerfile {
    pub(crate) fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instructions before the first FROM (comments and global ARGs)
    pub fn preamble(&self) -> &[Instruction] {
        let end = self
            .instructions
            .iter()
            .position(|i| matches!(i, Instruction::From { .. }))
            .unwrap_or(self.instructions.len());
        &self.instructions[..end]
    }

    pub fn stages(&self) -> Vec<Stage<'_>> {
        let starts: Vec<usize> = self
            .instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| matches!(i, Instruction::From { .. }))
            .map(|(idx, _)| idx)
            .collect();

        starts
            .iter()
            .enumerate()
            .filter_map(|(index, &start)| {
                let end = starts.get(index + 1).copied().unwrap_or(self.instructions.len());
                match &self.instructions[start] {
                    Instruction::From { image, alias } => Some(Stage {
                        index,
                        base: image,
                        alias: alias.as_deref(),
                        instructions: &self.instructions[start + 1..end],
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn final_stage(&self) -> Option<Stage<'_>> {
        self.stages().pop()
    }
}

impl fmt::Display for Dockerfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, instruction) in self.instructions.iter().enumerate() {
            let after_code = idx > 0 && !self.instructions[idx - 1].is_comment();
            if after_code && matches!(instruction, Instruction::From { .. } | Instruction::Comment(_)) {
                writeln!(f)?;
            }
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?i:your_[a-z0-9_]+|placeholder|change_?me)\b|\b(TODO|FIXME)\b|<(?i:[a-z][a-z0-9_-]*)>",
        )
        .expect("valid regex")
    })
}

/// First placeholder token in `text`, such as `your_script_name.py` or `<entrypoint>`
pub fn find_placeholder(text: &str) -> Option<&str> {
    placeholder_pattern().find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stage() -> Dockerfile {
        Dockerfile::from_instructions(vec![
            Instruction::Comment("build".into()),
            Instruction::From {
                image: ImageRef::new("golang", "1.22-alpine"),
                alias: Some("build".into()),
            },
            Instruction::Workdir("/src".into()),
            Instruction::From {
                image: ImageRef::new("alpine", "3.19"),
                alias: None,
            },
            Instruction::Workdir("/app".into()),
            Instruction::User("nobody".into()),
            Instruction::Cmd(Command::Exec(vec!["/app/server".into()])),
        ])
    }

    #[test]
    fn test_stages() {
        let doc = two_stage();
        let stages = doc.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].alias, Some("build"));
        assert_eq!(stages[0].workdir(), Some("/src"));
        assert_eq!(stages[1].user(), Some("nobody"));
        assert_eq!(doc.preamble().len(), 1);
    }

    #[test]
    fn test_final_stage_start_command() {
        let doc = two_stage();
        let last = doc.final_stage().unwrap();
        assert_eq!(
            last.start_command(),
            Some(&Command::Exec(vec!["/app/server".into()]))
        );
    }

    #[test]
    fn test_display_separates_stages() {
        let text = two_stage().to_string();
        assert!(text.starts_with("# build\nFROM golang:1.22-alpine AS build\n"));
        assert!(text.contains("WORKDIR /src\n\nFROM alpine:3.19\n"));
        assert!(text.ends_with("CMD [\"/app/server\"]\n"));
    }

    #[test]
    fn test_find_placeholder() {
        assert_eq!(
            find_placeholder(r#"CMD ["python", "your_script_name.py"]"#),
            Some("your_script_name")
        );
        assert_eq!(find_placeholder("RUN echo <entrypoint>"), Some("<entrypoint>"));
        assert_eq!(find_placeholder("# TODO: install deps"), Some("TODO"));
        assert_eq!(find_placeholder(r#"CMD ["python", "main.py"]"#), None);
        assert_eq!(find_placeholder(r#"CMD ["python", "todo.py"]"#), None);
    }

    #[test]
    fn test_empty_document_has_no_stages() {
        let doc = Dockerfile::default();
        assert!(doc.stages().is_empty());
        assert!(doc.final_stage().is_none());
    }
}
