use super::{
    code_lines, manifest_guarded, EntrypointEvidence, LexicalProfile, Runtime, StringDelimiter,
};
use crate::stack::LanguageId;
use regex::Regex;
use std::sync::OnceLock;

pub struct RubyRuntime;

const STRINGS: &[StringDelimiter] = &[
    StringDelimiter::multi_line("\""),
    StringDelimiter::multi_line("'"),
];

const DEFINITION_PREFIXES: &[&str] = &[
    "def ",
    "class ",
    "module ",
    "require ",
    "require_relative ",
    "include ",
    "extend ",
    "attr_",
];

fn program_guard() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(if|unless)\s+(__FILE__\s*==\s*\$(0|PROGRAM_NAME)|\$(0|PROGRAM_NAME)\s*==\s*__FILE__)")
            .expect("valid regex")
    })
}

fn constant_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*\s*=[^=]").expect("valid regex"))
}

impl Runtime for RubyRuntime {
    fn language(&self) -> LanguageId {
        LanguageId::Ruby
    }

    fn lexical_profile(&self) -> LexicalProfile {
        LexicalProfile {
            line_comments: &["#"],
            block_comment: Some(("=begin", "=end")),
            strings: STRINGS,
            regex_literals: true,
            heredocs: true,
            percent_literals: true,
        }
    }

    fn extensions(&self) -> &[&'static str] {
        &["rb"]
    }

    fn default_entry_file(&self) -> &'static str {
        "main.rb"
    }

    fn default_version(&self) -> &'static str {
        "3.3"
    }

    fn base_image(&self, version: Option<&str>) -> String {
        let version = version.unwrap_or(self.default_version());
        format!("ruby:{}-slim", version)
    }

    fn dependency_manifest(&self) -> &'static str {
        "Gemfile"
    }

    fn install_command(&self) -> String {
        manifest_guarded(self.dependency_manifest(), "bundle install")
    }

    fn start_command(&self, entry_file: &str) -> Vec<String> {
        vec!["ruby".to_string(), entry_file.to_string()]
    }

    fn entrypoint_evidence(&self, source: &str) -> EntrypointEvidence {
        if program_guard().is_match(source) {
            return EntrypointEvidence::new(1.0, "guarded by if __FILE__ == $0");
        }

        let mut definitions = 0usize;
        let mut statements = 0usize;
        let mut in_block_comment = false;

        for (top_level, line) in code_lines(source, &["#"]) {
            if line.starts_with("=begin") {
                in_block_comment = true;
                continue;
            }
            if in_block_comment {
                in_block_comment = !line.starts_with("=end");
                continue;
            }
            if !top_level {
                continue;
            }
            if DEFINITION_PREFIXES.iter().any(|p| line.starts_with(p))
                || line == "end"
                || constant_assignment().is_match(line)
            {
                definitions += 1;
            } else {
                statements += 1;
            }
        }

        if statements > 0 {
            EntrypointEvidence::new(
                0.9,
                format!("{} top-level statement(s) run when the file starts", statements),
            )
        } else if definitions > 0 {
            EntrypointEvidence::new(
                0.3,
                "only defines classes, modules or methods; nothing runs at start",
            )
        } else {
            EntrypointEvidence::new(0.1, "contains no executable statements")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruby_base_image() {
        assert_eq!(RubyRuntime.base_image(None), "ruby:3.3-slim");
    }

    #[test]
    fn test_puts_is_runnable() {
        assert_eq!(RubyRuntime.entrypoint_evidence("puts 'hi'\n").confidence, 0.9);
    }

    #[test]
    fn test_program_guard() {
        let source = "def main\n  puts 1\nend\n\nif __FILE__ == $0\n  main\nend\n";
        assert_eq!(RubyRuntime.entrypoint_evidence(source).confidence, 1.0);
    }

    #[test]
    fn test_class_only() {
        let source = "=begin\nDocs here\n=end\nrequire 'json'\nVERSION = '1.0'\n\nclass Greeter\n  def hi; end\nend\n";
        assert_eq!(RubyRuntime.entrypoint_evidence(source).confidence, 0.3);
    }

    #[test]
    fn test_start_command() {
        assert_eq!(
            RubyRuntime.start_command("main.rb"),
            vec!["ruby".to_string(), "main.rb".to_string()]
        );
    }
}
