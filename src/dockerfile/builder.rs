use super::image::ImageRef;
use super::instruction::{Command, Instruction};
use super::{find_placeholder, Dockerfile};
use thiserror::Error;

/// Reasons the builder refuses to produce a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Document has no FROM instruction")]
    MissingBaseImage,

    #[error("Instruction {keyword} appears before the first FROM")]
    InstructionBeforeFrom { keyword: String },

    #[error("Final stage has no WORKDIR")]
    MissingWorkdir,

    #[error("Final stage has no CMD or ENTRYPOINT")]
    MissingStartCommand,

    #[error("Start command is empty")]
    EmptyStartCommand,

    #[error("{keyword} instruction contains unresolved placeholder '{token}'")]
    Placeholder { keyword: String, token: String },
}

/// Assembles a [`Dockerfile`] instruction by instruction and checks it is
/// complete before handing it out.
///
/// ```
/// use deploychain::dockerfile::{Command, DockerfileBuilder, ImageRef};
///
/// let doc = DockerfileBuilder::new()
///     .from(ImageRef::new("python", "3.12-slim"))
///     .workdir("/app")
///     .copy(".", "/app")
///     .cmd(Command::Exec(vec!["python".into(), "main.py".into()]))
///     .build()
///     .unwrap();
/// assert!(doc.to_string().contains("WORKDIR /app"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DockerfileBuilder {
    instructions: Vec<Instruction>,
}

impl DockerfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(self, text: impl Into<String>) -> Self {
        self.instruction(Instruction::Comment(text.into()))
    }

    pub fn from(self, image: ImageRef) -> Self {
        self.instruction(Instruction::From { image, alias: None })
    }

    pub fn workdir(self, path: impl Into<String>) -> Self {
        self.instruction(Instruction::Workdir(path.into()))
    }

    pub fn copy(self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.instruction(Instruction::Copy {
            sources: vec![source.into()],
            destination: destination.into(),
            from: None,
            chown: None,
        })
    }

    pub fn run(self, command: impl Into<String>) -> Self {
        self.instruction(Instruction::Run(Command::Shell(command.into())))
    }

    pub fn user(self, user: impl Into<String>) -> Self {
        self.instruction(Instruction::User(user.into()))
    }

    pub fn cmd(self, command: Command) -> Self {
        self.instruction(Instruction::Cmd(command))
    }

    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn build(self) -> Result<Dockerfile, DocumentError> {
        let doc = Dockerfile::from_instructions(self.instructions);

        if let Some(early) = doc
            .preamble()
            .iter()
            .find(|i| !matches!(i, Instruction::Comment(_) | Instruction::Arg { .. }))
        {
            return Err(DocumentError::InstructionBeforeFrom {
                keyword: early.keyword().to_string(),
            });
        }

        let last = doc.final_stage().ok_or(DocumentError::MissingBaseImage)?;
        if last.workdir().is_none() {
            return Err(DocumentError::MissingWorkdir);
        }
        match last.start_command() {
            None => return Err(DocumentError::MissingStartCommand),
            Some(command) if command.is_empty() => return Err(DocumentError::EmptyStartCommand),
            Some(_) => {}
        }

        for instruction in doc.instructions().iter().filter(|i| !i.is_comment()) {
            if let Some(token) = find_placeholder(&instruction.arguments()) {
                return Err(DocumentError::Placeholder {
                    keyword: instruction.keyword().to_string(),
                    token: token.to_string(),
                });
            }
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_builder() -> DockerfileBuilder {
        DockerfileBuilder::new()
            .comment("Generated")
            .from(ImageRef::new("python", "3.12-slim"))
            .workdir("/app")
            .copy(".", "/app")
    }

    #[test]
    fn test_build_complete_document() {
        let doc = python_builder()
            .run("pip install -r requirements.txt")
            .user("nobody")
            .cmd(Command::Exec(vec!["python".into(), "main.py".into()]))
            .build()
            .unwrap();

        let text = doc.to_string();
        assert!(text.contains("FROM python:3.12-slim\n"));
        assert!(text.contains("USER nobody\n"));
        assert!(text.ends_with("CMD [\"python\", \"main.py\"]\n"));
    }

    #[test]
    fn test_missing_from() {
        let result = DockerfileBuilder::new().comment("only a comment").build();
        assert_eq!(result, Err(DocumentError::MissingBaseImage));
    }

    #[test]
    fn test_instruction_before_from() {
        let result = DockerfileBuilder::new()
            .workdir("/app")
            .from(ImageRef::new("python", "3.12-slim"))
            .build();
        assert_eq!(
            result,
            Err(DocumentError::InstructionBeforeFrom {
                keyword: "WORKDIR".into()
            })
        );
    }

    #[test]
    fn test_missing_workdir() {
        let result = DockerfileBuilder::new()
            .from(ImageRef::new("python", "3.12-slim"))
            .cmd(Command::Exec(vec!["python".into(), "main.py".into()]))
            .build();
        assert_eq!(result, Err(DocumentError::MissingWorkdir));
    }

    #[test]
    fn test_missing_and_empty_command() {
        assert_eq!(
            python_builder().build(),
            Err(DocumentError::MissingStartCommand)
        );
        assert_eq!(
            python_builder().cmd(Command::Exec(vec![])).build(),
            Err(DocumentError::EmptyStartCommand)
        );
    }

    #[test]
    fn test_placeholder_rejected() {
        let result = python_builder()
            .cmd(Command::Exec(vec![
                "python".into(),
                "your_script_name.py".into(),
            ]))
            .build();
        assert_eq!(
            result,
            Err(DocumentError::Placeholder {
                keyword: "CMD".into(),
                token: "your_script_name".into()
            })
        );
    }

    #[test]
    fn test_placeholder_in_comment_is_allowed() {
        let result = python_builder()
            .comment("TODO: pin dependencies")
            .cmd(Command::Exec(vec!["python".into(), "main.py".into()]))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_entrypoint_counts_as_start_command() {
        let doc = DockerfileBuilder::new()
            .from(ImageRef::new("node", "20-alpine"))
            .workdir("/app")
            .instruction(Instruction::Entrypoint(Command::Exec(vec![
                "node".into(),
                "index.js".into(),
            ])))
            .build()
            .unwrap();
        assert!(doc.to_string().contains("ENTRYPOINT [\"node\", \"index.js\"]"));
    }
}
