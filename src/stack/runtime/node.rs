use super::{
    code_lines, manifest_guarded, EntrypointEvidence, LexicalProfile, Runtime, StringDelimiter,
};
use crate::stack::LanguageId;
use regex::Regex;
use std::sync::OnceLock;

pub struct NodeRuntime;

const STRINGS: &[StringDelimiter] = &[
    StringDelimiter::multi_line("`"),
    StringDelimiter::single_line("\""),
    StringDelimiter::single_line("'"),
];

const DEFINITION_PREFIXES: &[&str] = &[
    "function ",
    "async function ",
    "class ",
    "import ",
    "export ",
    "module.exports",
    "exports.",
    "'use strict'",
    "\"use strict\"",
];

fn require_main() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"require\.main\s*===?\s*module|module\s*===?\s*require\.main")
            .expect("valid regex")
    })
}

fn declaration_without_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(const|let|var)\s+[^(]*$").expect("valid regex"))
}

fn require_binding() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(const|let|var)\s+[\w{}\s,]+=\s*require\(['"][^'"]+['"]\);?$"#)
            .expect("valid regex")
    })
}

fn esm_syntax() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(import\s+[\w{*][^;]*\s+from\s+['"]|import\s+['"]|export\s+)"#)
            .expect("valid regex")
    })
}

impl NodeRuntime {
    /// Whether the file uses ES module syntax and must be loaded as a module
    pub fn uses_esm(&self, source: &str) -> bool {
        esm_syntax().is_match(source)
    }
}

impl Runtime for NodeRuntime {
    fn language(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn lexical_profile(&self) -> LexicalProfile {
        LexicalProfile {
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            strings: STRINGS,
            regex_literals: true,
            heredocs: false,
            percent_literals: false,
        }
    }

    fn extensions(&self) -> &[&'static str] {
        &["js", "mjs", "cjs"]
    }

    fn default_entry_file(&self) -> &'static str {
        "index.js"
    }

    fn entry_file_for(&self, source: &str) -> &'static str {
        if self.uses_esm(source) {
            "index.mjs"
        } else {
            self.default_entry_file()
        }
    }

    fn default_version(&self) -> &'static str {
        "20"
    }

    fn base_image(&self, version: Option<&str>) -> String {
        let version = version.unwrap_or(self.default_version());
        format!("node:{}-alpine", version)
    }

    fn dependency_manifest(&self) -> &'static str {
        "package.json"
    }

    fn install_command(&self) -> String {
        manifest_guarded(self.dependency_manifest(), "npm install --omit=dev")
    }

    fn start_command(&self, entry_file: &str) -> Vec<String> {
        vec!["node".to_string(), entry_file.to_string()]
    }

    fn entrypoint_evidence(&self, source: &str) -> EntrypointEvidence {
        if require_main().is_match(source) {
            return EntrypointEvidence::new(1.0, "guarded by require.main === module");
        }

        let mut definitions = 0usize;
        let mut statements = 0usize;
        let mut in_block_comment = false;

        for (top_level, line) in code_lines(source, &["//"]) {
            if in_block_comment || line.starts_with("/*") {
                in_block_comment = !line.contains("*/");
                continue;
            }
            if !top_level || line.starts_with(['}', ')', ']', '*']) {
                continue;
            }
            if DEFINITION_PREFIXES.iter().any(|p| line.starts_with(p))
                || declaration_without_call().is_match(line)
                || require_binding().is_match(line)
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
                "only declares functions, classes or exports; nothing runs at start",
            )
        } else {
            EntrypointEvidence::new(0.1, "contains no executable statements")
        }
    }
}
