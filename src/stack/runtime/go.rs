use super::{manifest_guarded, EntrypointEvidence, LexicalProfile, Runtime, StringDelimiter};
use crate::stack::LanguageId;
use regex::Regex;
use std::sync::OnceLock;

pub struct GoRuntime;

const BINARY_PATH: &str = "/usr/local/bin/app";

const STRINGS: &[StringDelimiter] = &[
    StringDelimiter::raw("`"),
    StringDelimiter::single_line("\""),
    StringDelimiter::single_line("'"),
];

fn package_clause() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^package\s+(\w+)").expect("valid regex"))
}

fn main_func() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^func\s+main\s*\(\s*\)").expect("valid regex"))
}

impl Runtime for GoRuntime {
    fn language(&self) -> LanguageId {
        LanguageId::Go
    }

    fn lexical_profile(&self) -> LexicalProfile {
        LexicalProfile {
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            strings: STRINGS,
            regex_literals: false,
            heredocs: false,
            percent_literals: false,
        }
    }

    fn extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn default_entry_file(&self) -> &'static str {
        "main.go"
    }

    fn default_version(&self) -> &'static str {
        "1.22"
    }

    fn base_image(&self, version: Option<&str>) -> String {
        let version = version.unwrap_or(self.default_version());
        format!("golang:{}-alpine", version)
    }

    fn dependency_manifest(&self) -> &'static str {
        "go.mod"
    }

    fn install_command(&self) -> String {
        manifest_guarded(self.dependency_manifest(), "go mod download")
    }

    fn build_commands(&self, entry_file: &str) -> Vec<String> {
        vec![format!(
            "if [ -f go.mod ]; then go build -o {bin} .; else go build -o {bin} {entry}; fi",
            bin = BINARY_PATH,
            entry = entry_file
        )]
    }

    fn start_command(&self, _entry_file: &str) -> Vec<String> {
        vec![BINARY_PATH.to_string()]
    }

    fn entrypoint_evidence(&self, source: &str) -> EntrypointEvidence {
        let package = package_clause()
            .captures(source)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());

        match package {
            Some("main") if main_func().is_match(source) => {
                EntrypointEvidence::new(1.0, "declares package main with func main()")
            }
            Some("main") => EntrypointEvidence::new(0.1, "package main has no func main()"),
            Some(other) => EntrypointEvidence::new(
                0.0,
                format!("package {} is a library package, not a program", other),
            ),
            None => EntrypointEvidence::new(0.0, "missing package clause"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_base_image() {
        assert_eq!(GoRuntime.base_image(None), "golang:1.22-alpine");
    }

    #[test]
    fn test_go_build_commands() {
        let commands = GoRuntime.build_commands("main.go");
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("go build -o /usr/local/bin/app main.go"));
    }

    #[test]
    fn test_main_package() {
        let source = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n";
        assert_eq!(GoRuntime.entrypoint_evidence(source).confidence, 1.0);
    }

    #[test]
    fn test_library_package() {
        let evidence = GoRuntime.entrypoint_evidence("package util\n\nfunc Add(a, b int) int { return a + b }\n");
        assert_eq!(evidence.confidence, 0.0);
        assert!(evidence.reason.contains("package util"));
    }

    #[test]
    fn test_main_without_func_main() {
        assert_eq!(GoRuntime.entrypoint_evidence("package main\n").confidence, 0.1);
    }
}
