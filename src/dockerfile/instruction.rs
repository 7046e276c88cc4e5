use super::image::ImageRef;
use std::fmt;

/// Command argument of RUN, CMD and ENTRYPOINT
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// JSON array form, executed without a shell
    Exec(Vec<String>),
    /// Shell form, executed through `/bin/sh -c`
    Shell(String),
}

impl Command {
    pub fn is_empty(&self) -> bool {
        match self {
            Command::Exec(args) => args.iter().all(|a| a.trim().is_empty()),
            Command::Shell(line) => line.trim().is_empty(),
        }
    }

    pub fn words(&self) -> Vec<&str> {
        match self {
            Command::Exec(args) => args.iter().map(String::as_str).collect(),
            Command::Shell(line) => line.split_whitespace().collect(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exec(args) => write_json_array(f, args),
            Command::Shell(line) => write!(f, "{}", line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Comment(String),
    Arg {
        name: String,
        default: Option<String>,
    },
    From {
        image: ImageRef,
        alias: Option<String>,
    },
    Workdir(String),
    Copy {
        sources: Vec<String>,
        destination: String,
        from: Option<String>,
        chown: Option<String>,
    },
    Add {
        sources: Vec<String>,
        destination: String,
    },
    Run(Command),
    Env(Vec<(String, String)>),
    Label(Vec<(String, String)>),
    Expose(Vec<String>),
    User(String),
    Cmd(Command),
    Entrypoint(Command),
    /// Instructions carried through verbatim (HEALTHCHECK, VOLUME, SHELL, ...)
    Other {
        keyword: String,
        arguments: String,
    },
}

impl Instruction {
    pub fn keyword(&self) -> &str {
        match self {
            Instruction::Comment(_) => "#",
            Instruction::Arg { .. } => "ARG",
            Instruction::From { .. } => "FROM",
            Instruction::Workdir(_) => "WORKDIR",
            Instruction::Copy { .. } => "COPY",
            Instruction::Add { .. } => "ADD",
            Instruction::Run(_) => "RUN",
            Instruction::Env(_) => "ENV",
            Instruction::Label(_) => "LABEL",
            Instruction::Expose(_) => "EXPOSE",
            Instruction::User(_) => "USER",
            Instruction::Cmd(_) => "CMD",
            Instruction::Entrypoint(_) => "ENTRYPOINT",
            Instruction::Other { keyword, .. } => keyword.as_str(),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Instruction::Comment(_))
    }

    /// Rendered arguments without the keyword
    pub fn arguments(&self) -> String {
        let line = self.to_string();
        match self {
            Instruction::Comment(text) => text.clone(),
            _ => line
                .strip_prefix(self.keyword())
                .map(|rest| rest.trim_start().to_string())
                .unwrap_or(line),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Comment(text) => {
                if text.is_empty() {
                    write!(f, "#")
                } else {
                    write!(f, "# {}", text)
                }
            }
            Instruction::Arg { name, default } => match default {
                Some(value) => write!(f, "ARG {}={}", name, quote_value(value)),
                None => write!(f, "ARG {}", name),
            },
            Instruction::From { image, alias } => match alias {
                Some(alias) => write!(f, "FROM {} AS {}", image, alias),
                None => write!(f, "FROM {}", image),
            },
            Instruction::Workdir(path) => write!(f, "WORKDIR {}", path),
            Instruction::Copy {
                sources,
                destination,
                from,
                chown,
            } => {
                write!(f, "COPY")?;
                if let Some(stage) = from {
                    write!(f, " --from={}", stage)?;
                }
                if let Some(owner) = chown {
                    write!(f, " --chown={}", owner)?;
                }
                write!(f, " ")?;
                write_paths(f, sources, destination)
            }
            Instruction::Add {
                sources,
                destination,
            } => {
                write!(f, "ADD ")?;
                write_paths(f, sources, destination)
            }
            Instruction::Run(command) => write!(f, "RUN {}", command),
            Instruction::Env(pairs) => write!(f, "ENV {}", render_pairs(pairs)),
            Instruction::Label(pairs) => write!(f, "LABEL {}", render_pairs(pairs)),
            Instruction::Expose(ports) => write!(f, "EXPOSE {}", ports.join(" ")),
            Instruction::User(user) => write!(f, "USER {}", user),
            Instruction::Cmd(command) => write!(f, "CMD {}", command),
            Instruction::Entrypoint(command) => write!(f, "ENTRYPOINT {}", command),
            Instruction::Other { keyword, arguments } => write!(f, "{} {}", keyword, arguments),
        }
    }
}

fn write_json_array(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| serde_json::Value::String(item.clone()).to_string())
        .collect();
    write!(f, "[{}]", quoted.join(", "))
}

fn write_paths(f: &mut fmt::Formatter<'_>, sources: &[String], destination: &str) -> fmt::Result {
    let mut all: Vec<String> = sources.to_vec();
    all.push(destination.to_string());
    if all.iter().any(|p| p.chars().any(char::is_whitespace)) {
        write_json_array(f, &all)
    } else {
        write!(f, "{}", all.join(" "))
    }
}

fn quote_value(value: &str) -> String {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"') {
        serde_json::Value::String(value.to_string()).to_string()
    } else {
        value.to_string()
    }
}

fn render_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, quote_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_form_rendering() {
        let cmd = Instruction::Cmd(Command::Exec(vec!["python".into(), "main.py".into()]));
        assert_eq!(cmd.to_string(), r#"CMD ["python", "main.py"]"#);
    }

    #[test]
    fn test_shell_form_rendering() {
        let run = Instruction::Run(Command::Shell("pip install flask".into()));
        assert_eq!(run.to_string(), "RUN pip install flask");
        assert_eq!(run.arguments(), "pip install flask");
    }

    #[test]
    fn test_from_with_alias() {
        let from = Instruction::From {
            image: ImageRef::new("golang", "1.22-alpine"),
            alias: Some("build".into()),
        };
        assert_eq!(from.to_string(), "FROM golang:1.22-alpine AS build");
    }

    #[test]
    fn test_copy_rendering() {
        let copy = Instruction::Copy {
            sources: vec![".".into()],
            destination: "/app".into(),
            from: None,
            chown: Some("nobody".into()),
        };
        assert_eq!(copy.to_string(), "COPY --chown=nobody . /app");

        let spaced = Instruction::Copy {
            sources: vec!["my file.txt".into()],
            destination: "/app/".into(),
            from: None,
            chown: None,
        };
        assert_eq!(spaced.to_string(), r#"COPY ["my file.txt", "/app/"]"#);
    }

    #[test]
    fn test_env_quotes_values_with_spaces() {
        let env = Instruction::Env(vec![
            ("PYTHONUNBUFFERED".into(), "1".into()),
            ("GREETING".into(), "hello world".into()),
        ]);
        assert_eq!(
            env.to_string(),
            r#"ENV PYTHONUNBUFFERED=1 GREETING="hello world""#
        );
    }

    #[test]
    fn test_command_is_empty() {
        assert!(Command::Exec(vec![]).is_empty());
        assert!(Command::Shell("  ".into()).is_empty());
        assert!(!Command::Exec(vec!["node".into()]).is_empty());
    }

    #[test]
    fn test_comment_rendering() {
        assert_eq!(Instruction::Comment("Generated".into()).to_string(), "# Generated");
        assert_eq!(Instruction::Comment(String::new()).to_string(), "#");
    }
}
