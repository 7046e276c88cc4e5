use super::{
    code_lines, manifest_guarded, EntrypointEvidence, LexicalProfile, Runtime, StringDelimiter,
};
use crate::stack::LanguageId;
use regex::Regex;
use std::sync::OnceLock;

pub struct PythonRuntime;

const STRINGS: &[StringDelimiter] = &[
    StringDelimiter::multi_line("\"\"\""),
    StringDelimiter::multi_line("'''"),
    StringDelimiter::single_line("\""),
    StringDelimiter::single_line("'"),
];

const DEFINITION_PREFIXES: &[&str] = &[
    "def ",
    "async def ",
    "class ",
    "import ",
    "from ",
    "@",
];

fn main_guard() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^if\s+__name__\s*==\s*['"]__main__['"]\s*:"#).expect("valid regex")
    })
}

fn plain_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][\w\s,]*(:\s*[^=]+)?=[^=]").expect("valid regex")
    })
}

impl Runtime for PythonRuntime {
    fn language(&self) -> LanguageId {
        LanguageId::Python
    }

    fn lexical_profile(&self) -> LexicalProfile {
        LexicalProfile {
            line_comments: &["#"],
            block_comment: None,
            strings: STRINGS,
            regex_literals: false,
            heredocs: false,
            percent_literals: false,
        }
    }

    fn indentation_sensitive(&self) -> bool {
        true
    }

    fn extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn default_entry_file(&self) -> &'static str {
        "main.py"
    }

    fn default_version(&self) -> &'static str {
        "3.12"
    }

    fn base_image(&self, version: Option<&str>) -> String {
        let version = version.unwrap_or(self.default_version());
        format!("python:{}-slim", version)
    }

    fn dependency_manifest(&self) -> &'static str {
        "requirements.txt"
    }

    fn install_command(&self) -> String {
        manifest_guarded(
            self.dependency_manifest(),
            "pip install --no-cache-dir -r requirements.txt",
        )
    }

    fn start_command(&self, entry_file: &str) -> Vec<String> {
        vec!["python".to_string(), entry_file.to_string()]
    }

    fn entrypoint_evidence(&self, source: &str) -> EntrypointEvidence {
        if main_guard().is_match(source) {
            return EntrypointEvidence::new(1.0, "guarded by if __name__ == \"__main__\"");
        }

        let mut in_docstring = false;
        let mut definitions = 0usize;
        let mut statements = 0usize;

        for (top_level, line) in code_lines(source, &["#"]) {
            let quotes = line.matches("\"\"\"").count() + line.matches("'''").count();
            if in_docstring || (top_level && quotes > 0 && line.starts_with(['"', '\''])) {
                if quotes % 2 == 1 {
                    in_docstring = !in_docstring;
                }
                continue;
            }
            if !top_level {
                continue;
            }
            if DEFINITION_PREFIXES.iter().any(|p| line.starts_with(p)) {
                definitions += 1;
            } else if line.starts_with([')', ']', '}']) {
                continue;
            } else if plain_assignment().is_match(line) && !line.contains('(') {
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
                "only defines functions, classes or constants; nothing runs at start",
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
    fn test_python_base_image_default() {
        assert_eq!(PythonRuntime.base_image(None), "python:3.12-slim");
    }

    #[test]
    fn test_python_base_image_versioned() {
        assert_eq!(PythonRuntime.base_image(Some("3.11")), "python:3.11-slim");
    }

    #[test]
    fn test_python_start_command() {
        assert_eq!(
            PythonRuntime.start_command("main.py"),
            vec!["python".to_string(), "main.py".to_string()]
        );
    }

    #[test]
    fn test_main_guard_is_certain() {
        let source = "def run():\n    pass\n\nif __name__ == \"__main__\":\n    run()\n";
        assert_eq!(PythonRuntime.entrypoint_evidence(source).confidence, 1.0);
    }

    #[test]
    fn test_top_level_call_is_runnable() {
        let evidence = PythonRuntime.entrypoint_evidence("print('hi')");
        assert_eq!(evidence.confidence, 0.9);
    }

    #[test]
    fn test_definitions_only_is_not_runnable() {
        let source = "\"\"\"Helpers.\n\nMore text.\n\"\"\"\nimport os\n\nLIMIT = 3\n\ndef helper():\n    return os.getcwd()\n";
        let evidence = PythonRuntime.entrypoint_evidence(source);
        assert_eq!(evidence.confidence, 0.3);
        assert!(evidence.reason.contains("only defines"));
    }

    #[test]
    fn test_assignment_with_call_counts_as_statement() {
        let evidence = PythonRuntime.entrypoint_evidence("import sys\nresult = sys.exit(0)\n");
        assert_eq!(evidence.confidence, 0.9);
    }

    #[test]
    fn test_comments_only() {
        let evidence = PythonRuntime.entrypoint_evidence("# nothing here\n");
        assert_eq!(evidence.confidence, 0.1);
    }
}
