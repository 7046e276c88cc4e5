//! Dockerfile text parser
//!
//! Handles comments, backslash line continuations, exec-form JSON arrays,
//! `FROM image AS alias`, `COPY --from/--chown` flags and `KEY=value` pairs.

use super::image::{ImageRef, ImageRefError};
use super::instruction::{Command, Instruction};
use super::Dockerfile;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unknown instruction '{keyword}'")]
    UnknownInstruction { line: usize, keyword: String },

    #[error("line {line}: {keyword} requires arguments")]
    MissingArguments { line: usize, keyword: String },

    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },

    #[error("line {line}: invalid image reference: {source}")]
    Image {
        line: usize,
        #[source]
        source: ImageRefError,
    },

    #[error("line {line}: unterminated quote")]
    UnterminatedQuote { line: usize },
}

const PASSTHROUGH: &[&str] = &[
    "HEALTHCHECK",
    "VOLUME",
    "SHELL",
    "STOPSIGNAL",
    "ONBUILD",
    "MAINTAINER",
];

impl Dockerfile {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut instructions = Vec::new();
        for (line, content) in logical_lines(text) {
            if let Some(comment) = content.strip_prefix('#') {
                instructions.push(Instruction::Comment(comment.trim().to_string()));
                continue;
            }
            instructions.push(parse_instruction(line, &content)?);
        }
        Ok(Dockerfile::from_instructions(instructions))
    }
}

/// Joins continuation lines; yields (first line number, content)
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let trimmed = raw.trim();

        if let Some((_, buffer)) = pending.as_mut() {
            // Comment and blank lines inside a continuation are dropped
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match trimmed.strip_suffix('\\') {
                Some(part) => {
                    buffer.push(' ');
                    buffer.push_str(part.trim());
                }
                None => {
                    buffer.push(' ');
                    buffer.push_str(trimmed);
                    lines.extend(pending.take());
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            lines.push((number, trimmed.to_string()));
            continue;
        }
        match trimmed.strip_suffix('\\') {
            Some(part) => pending = Some((number, part.trim().to_string())),
            None => lines.push((number, trimmed.to_string())),
        }
    }

    lines.extend(pending);
    lines
}

fn parse_instruction(line: usize, content: &str) -> Result<Instruction, ParseError> {
    let (keyword, rest) = match content.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword.to_ascii_uppercase(), rest.trim()),
        None => (content.to_ascii_uppercase(), ""),
    };

    if rest.is_empty() {
        return Err(ParseError::MissingArguments { line, keyword });
    }

    let instruction = match keyword.as_str() {
        "FROM" => parse_from(line, rest)?,
        "ARG" => {
            let (name, default) = match rest.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(unquote(line, value)?)),
                None => (rest.to_string(), None),
            };
            Instruction::Arg { name, default }
        }
        "WORKDIR" => Instruction::Workdir(rest.to_string()),
        "USER" => Instruction::User(rest.to_string()),
        "RUN" => Instruction::Run(parse_command(rest)),
        "CMD" => Instruction::Cmd(parse_command(rest)),
        "ENTRYPOINT" => Instruction::Entrypoint(parse_command(rest)),
        "ENV" => Instruction::Env(parse_pairs(line, rest, true)?),
        "LABEL" => Instruction::Label(parse_pairs(line, rest, false)?),
        "EXPOSE" => Instruction::Expose(rest.split_whitespace().map(String::from).collect()),
        "COPY" | "ADD" => parse_copy(line, &keyword, rest)?,
        other if PASSTHROUGH.contains(&other) => Instruction::Other {
            keyword: other.to_string(),
            arguments: rest.to_string(),
        },
        _ => return Err(ParseError::UnknownInstruction { line, keyword }),
    };

    Ok(instruction)
}

fn parse_from(line: usize, rest: &str) -> Result<Instruction, ParseError> {
    let words: Vec<&str> = rest
        .split_whitespace()
        .filter(|w| !w.starts_with("--"))
        .collect();

    let (image, alias) = match words.as_slice() {
        [image] => (*image, None),
        [image, as_kw, alias] if as_kw.eq_ignore_ascii_case("as") => {
            (*image, Some(alias.to_string()))
        }
        _ => {
            return Err(ParseError::Invalid {
                line,
                message: format!("expected 'FROM image [AS name]', got 'FROM {}'", rest),
            })
        }
    };

    let image = ImageRef::parse(image).map_err(|source| ParseError::Image { line, source })?;
    Ok(Instruction::From { image, alias })
}

fn parse_command(rest: &str) -> Command {
    if rest.starts_with('[') {
        if let Ok(args) = serde_json::from_str::<Vec<String>>(rest) {
            return Command::Exec(args);
        }
    }
    Command::Shell(rest.to_string())
}

fn parse_copy(line: usize, keyword: &str, rest: &str) -> Result<Instruction, ParseError> {
    let mut from = None;
    let mut chown = None;
    let mut remaining = rest;

    while remaining.starts_with("--") {
        let (flag, tail) = remaining
            .split_once(char::is_whitespace)
            .unwrap_or((remaining, ""));
        if let Some(value) = flag.strip_prefix("--from=") {
            from = Some(value.to_string());
        } else if let Some(value) = flag.strip_prefix("--chown=") {
            chown = Some(value.to_string());
        }
        remaining = tail.trim_start();
    }

    let mut paths = if remaining.starts_with('[') {
        serde_json::from_str::<Vec<String>>(remaining).map_err(|e| ParseError::Invalid {
            line,
            message: format!("invalid JSON array: {}", e),
        })?
    } else {
        split_words(line, remaining)?
    };

    if paths.len() < 2 {
        return Err(ParseError::Invalid {
            line,
            message: format!("{} requires at least one source and a destination", keyword),
        });
    }
    let destination = paths.pop().unwrap_or_default();

    Ok(if keyword == "ADD" {
        Instruction::Add {
            sources: paths,
            destination,
        }
    } else {
        Instruction::Copy {
            sources: paths,
            destination,
            from,
            chown,
        }
    })
}

/// `KEY=value KEY2="two words"`, or the legacy `KEY value` form when allowed
fn parse_pairs(line: usize, rest: &str, legacy: bool) -> Result<Vec<(String, String)>, ParseError> {
    let first = rest.split_whitespace().next().unwrap_or_default();
    if legacy && !first.contains('=') {
        let value = rest[first.len()..].trim();
        return Ok(vec![(first.to_string(), unquote(line, value)?)]);
    }

    split_words(line, rest)?
        .into_iter()
        .map(|word| match word.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => Err(ParseError::Invalid {
                line,
                message: format!("expected KEY=value, got '{}'", word),
            }),
        })
        .collect()
}

fn unquote(line: usize, value: &str) -> Result<String, ParseError> {
    Ok(split_words(line, value)?.join(" "))
}

/// Splits on whitespace, honouring single quotes, double quotes and backslash escapes.
/// Quotes are removed from the returned words.
fn split_words(line: usize, input: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote { line });
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_dockerfile() {
        let text = r#"
# Generated Dockerfile
FROM python:3.9-slim

WORKDIR /app
COPY . /app
CMD ["python", "main.py"]
"#;
        let doc = Dockerfile::parse(text).unwrap();
        let instructions = doc.instructions();
        assert_eq!(instructions.len(), 5);
        assert_eq!(instructions[0], Instruction::Comment("Generated Dockerfile".into()));
        assert_eq!(
            instructions[4],
            Instruction::Cmd(Command::Exec(vec!["python".into(), "main.py".into()]))
        );
    }

    #[test]
    fn test_line_continuation() {
        let text = "FROM alpine:3.19\nRUN apk add \\\n    # comment inside\n    curl \\\n    git\n";
        let doc = Dockerfile::parse(text).unwrap();
        assert_eq!(
            doc.instructions()[1],
            Instruction::Run(Command::Shell("apk add curl git".into()))
        );
    }

    #[test]
    fn test_from_with_alias_and_platform() {
        let doc = Dockerfile::parse("FROM --platform=linux/amd64 golang:1.22 as build\n").unwrap();
        assert_eq!(
            doc.instructions()[0],
            Instruction::From {
                image: ImageRef::new("golang", "1.22"),
                alias: Some("build".into()),
            }
        );
    }

    #[test]
    fn test_copy_flags() {
        let doc = Dockerfile::parse("COPY --from=build --chown=app:app /out/app /usr/local/bin/\n")
            .unwrap();
        assert_eq!(
            doc.instructions()[0],
            Instruction::Copy {
                sources: vec!["/out/app".into()],
                destination: "/usr/local/bin/".into(),
                from: Some("build".into()),
                chown: Some("app:app".into()),
            }
        );
    }

    #[test]
    fn test_copy_json_form() {
        let doc = Dockerfile::parse("COPY [\"my file.txt\", \"/app/\"]\n").unwrap();
        assert_eq!(
            doc.instructions()[0],
            Instruction::Copy {
                sources: vec!["my file.txt".into()],
                destination: "/app/".into(),
                from: None,
                chown: None,
            }
        );
    }

    #[test]
    fn test_env_forms() {
        let doc = Dockerfile::parse("ENV A=1 B=\"two words\"\nENV LEGACY some value\n").unwrap();
        assert_eq!(
            doc.instructions()[0],
            Instruction::Env(vec![
                ("A".into(), "1".into()),
                ("B".into(), "two words".into())
            ])
        );
        assert_eq!(
            doc.instructions()[1],
            Instruction::Env(vec![("LEGACY".into(), "some value".into())])
        );
    }

    #[test]
    fn test_unknown_instruction() {
        let err = Dockerfile::parse("FROM alpine:3.19\nBUILD stuff\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownInstruction {
                line: 2,
                keyword: "BUILD".into()
            }
        );
    }

    #[test]
    fn test_missing_arguments() {
        let err = Dockerfile::parse("FROM\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingArguments { line: 1, .. }));
    }

    #[test]
    fn test_invalid_image() {
        let err = Dockerfile::parse("FROM python:\n").unwrap_err();
        assert!(err.to_string().contains("line 1: invalid image reference"));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Dockerfile::parse("ENV A=\"oops\n").unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote { line: 1 });
    }

    #[test]
    fn test_shell_form_cmd_and_passthrough() {
        let doc = Dockerfile::parse("CMD python main.py\nHEALTHCHECK CMD curl -f http://localhost/\n")
            .unwrap();
        assert_eq!(
            doc.instructions()[0],
            Instruction::Cmd(Command::Shell("python main.py".into()))
        );
        assert_eq!(doc.instructions()[1].keyword(), "HEALTHCHECK");
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let text = "FROM node:20-alpine\nWORKDIR /app\nCOPY . /app\nUSER nobody\nCMD [\"node\", \"index.js\"]\n";
        let doc = Dockerfile::parse(text).unwrap();
        assert_eq!(doc.to_string(), text);
    }
}
