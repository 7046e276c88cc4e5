use super::lexer;
use crate::stack::Runtime;
use anyhow::{bail, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Check applied to submitted source text
pub trait SourceRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn check(&self, source: &str, runtime: &dyn Runtime) -> Result<()>;
}

/// Converts a byte offset into a 1-based (line, column) pair
fn position_of(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

pub struct NonEmptySourceRule;

impl SourceRule for NonEmptySourceRule {
    fn name(&self) -> &'static str {
        "NonEmptySource"
    }

    fn description(&self) -> &'static str {
        "Source must contain code"
    }

    fn check(&self, source: &str, _runtime: &dyn Runtime) -> Result<()> {
        if source.trim().is_empty() {
            bail!("Source code is empty");
        }
        Ok(())
    }
}

pub struct SourceSizeRule {
    pub max_bytes: usize,
}

impl SourceRule for SourceSizeRule {
    fn name(&self) -> &'static str {
        "SourceSize"
    }

    fn description(&self) -> &'static str {
        "Source must not exceed the configured size limit"
    }

    fn check(&self, source: &str, _runtime: &dyn Runtime) -> Result<()> {
        if source.len() > self.max_bytes {
            bail!(
                "Source is {} bytes, the limit is {} bytes",
                source.len(),
                self.max_bytes
            );
        }
        Ok(())
    }
}

pub struct TextEncodingRule;

impl SourceRule for TextEncodingRule {
    fn name(&self) -> &'static str {
        "TextEncoding"
    }

    fn description(&self) -> &'static str {
        "Source must be plain text without NUL or control characters"
    }

    fn check(&self, source: &str, _runtime: &dyn Runtime) -> Result<()> {
        let found = source
            .char_indices()
            .find(|(_, c)| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));

        if let Some((offset, ch)) = found {
            let (line, column) = position_of(source, offset);
            bail!(
                "Control character U+{:04X} at line {}, column {}",
                ch as u32,
                line,
                column
            );
        }
        Ok(())
    }
}

fn conflict_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(<{7}|={7}|>{7})([ \t].*)?\r?$").expect("valid regex"))
}

pub struct ConflictMarkersRule;

impl SourceRule for ConflictMarkersRule {
    fn name(&self) -> &'static str {
        "ConflictMarkers"
    }

    fn description(&self) -> &'static str {
        "Source must not contain unresolved merge conflict markers"
    }

    fn check(&self, source: &str, _runtime: &dyn Runtime) -> Result<()> {
        if let Some(found) = conflict_marker().find(source) {
            let (line, _) = position_of(source, found.start());
            let marker = &found.as_str()[..7];
            bail!(
                "Merge conflict marker '{}' at line {}, column 1",
                marker,
                line
            );
        }
        Ok(())
    }
}

pub struct BalancedDelimitersRule;

impl SourceRule for BalancedDelimitersRule {
    fn name(&self) -> &'static str {
        "BalancedDelimiters"
    }

    fn description(&self) -> &'static str {
        "Brackets, string literals and block comments must be closed"
    }

    fn check(&self, source: &str, runtime: &dyn Runtime) -> Result<()> {
        if let Some(issue) = lexer::scan(source, &runtime.lexical_profile()) {
            bail!("{}", issue);
        }
        Ok(())
    }
}

pub struct ConsistentIndentationRule;

impl SourceRule for ConsistentIndentationRule {
    fn name(&self) -> &'static str {
        "ConsistentIndentation"
    }

    fn description(&self) -> &'static str {
        "Indentation-sensitive sources must not mix tabs and spaces"
    }

    fn check(&self, source: &str, runtime: &dyn Runtime) -> Result<()> {
        if !runtime.indentation_sensitive() {
            return Ok(());
        }

        let mut first_tab = None;
        let mut first_space = None;

        for (idx, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            if indent.contains('\t') && first_tab.is_none() {
                first_tab = Some(idx + 1);
            }
            if indent.contains(' ') && first_space.is_none() {
                first_space = Some(idx + 1);
            }
            if let (Some(tab), Some(space)) = (first_tab, first_space) {
                if tab == space {
                    bail!("Line {} indents with both tabs and spaces", tab);
                }
                bail!(
                    "Line {} indents with tabs but line {} indents with spaces",
                    tab,
                    space
                );
            }
        }
        Ok(())
    }
}

fn string_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\b([A-Za-z_][A-Za-z0-9_]*)["']?\s*(?:=|:|=>)\s*["']([^"'\s]{8,})["']"#,
        )
        .expect("valid regex")
    })
}

fn credential_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|_)(?:password|passwd|secret|token|api_?key)(?:_|$)").expect("valid regex")
    })
}

/// Whether one of the `snake_case` or `camelCase` words of `name` is a
/// credential word; `tokenizer` and `max_tokens` are not
fn is_credential_name(name: &str) -> bool {
    let mut normalized = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && matches!(previous, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            normalized.push('_');
        }
        normalized.push(c.to_ascii_lowercase());
        previous = Some(c);
    }
    credential_segment().is_match(&normalized)
}

pub struct HardcodedSecretRule;

impl SourceRule for HardcodedSecretRule {
    fn name(&self) -> &'static str {
        "HardcodedSecret"
    }

    fn description(&self) -> &'static str {
        "Credentials must not be assigned as string literals"
    }

    fn check(&self, source: &str, _runtime: &dyn Runtime) -> Result<()> {
        let assignment = string_assignment().captures_iter(source).find(|captures| {
            captures
                .get(1)
                .is_some_and(|name| is_credential_name(name.as_str()))
        });
        if let Some(captures) = assignment {
            let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let start = captures.get(0).map(|m| m.start()).unwrap_or_default();
            let (line, column) = position_of(source, start);
            bail!(
                "Hard-coded credential assigned to '{}' at line {}, column {}",
                name,
                line,
                column
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::runtime::{GoRuntime, NodeRuntime, PythonRuntime, RubyRuntime};
    use yare::parameterized;

    #[test]
    fn test_position_of() {
        assert_eq!(position_of("abc\ndef", 5), (2, 2));
        assert_eq!(position_of("abc", 0), (1, 1));
    }

    #[test]
    fn test_non_empty_source() {
        assert!(NonEmptySourceRule.check("print('hi')", &PythonRuntime).is_ok());
        let err = NonEmptySourceRule.check(" \n\t\n", &PythonRuntime).unwrap_err();
        assert_eq!(err.to_string(), "Source code is empty");
    }

    #[test]
    fn test_source_size() {
        let rule = SourceSizeRule { max_bytes: 8 };
        assert!(rule.check("12345678", &PythonRuntime).is_ok());
        let err = rule.check("123456789", &PythonRuntime).unwrap_err();
        assert_eq!(err.to_string(), "Source is 9 bytes, the limit is 8 bytes");
    }

    #[test]
    fn test_text_encoding() {
        assert!(TextEncodingRule.check("a\tb\r\nc\n", &PythonRuntime).is_ok());
        let err = TextEncodingRule.check("x = 1\ny\0 = 2\n", &PythonRuntime).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Control character U+0000 at line 2, column 2"
        );
    }

    #[parameterized(
        ours = { "<<<<<<< HEAD\nx = 1\n" },
        separator = { "x = 1\n=======\ny = 2\n" },
        theirs = { ">>>>>>> feature-branch\n" },
        crlf = { "x = 1\r\n=======\r\n" },
    )]
    fn test_conflict_markers_rejected(source: &str) {
        let err = ConflictMarkersRule.check(source, &PythonRuntime).unwrap_err();
        assert!(err.to_string().starts_with("Merge conflict marker"));
    }

    #[parameterized(
        heading_underline = { "Title\n========\n" },
        inline = { "x = '<<<<<<< not at line start'\n" },
        shift = { "x = y << 7\n" },
    )]
    fn test_conflict_markers_accepted(source: &str) {
        assert!(ConflictMarkersRule.check(source, &PythonRuntime).is_ok());
    }

    #[test]
    fn test_conflict_marker_line_number() {
        let err = ConflictMarkersRule
            .check("a = 1\nb = 2\n<<<<<<< HEAD\n", &PythonRuntime)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Merge conflict marker '<<<<<<<' at line 3, column 1"
        );
    }

    #[parameterized(
        python = { &PythonRuntime as &dyn Runtime, "def f(x):\n    return [x, {'k': (1, 2)}]\n" },
        javascript = { &NodeRuntime as &dyn Runtime, "function f() { return `(${1})`; } // )\n" },
        ruby = { &RubyRuntime as &dyn Runtime, "def f\n  puts \"(\"\nend\n" },
        go = { &GoRuntime as &dyn Runtime, "package main\nfunc main() { println(\"}\") }\n" },
    )]
    fn test_balanced_delimiters_accepted(runtime: &dyn Runtime, source: &str) {
        assert!(BalancedDelimitersRule.check(source, runtime).is_ok());
    }

    #[test]
    fn test_balanced_delimiters_rejected() {
        let err = BalancedDelimitersRule
            .check("print('hi'\n", &PythonRuntime)
            .unwrap_err();
        assert_eq!(err.to_string(), "'(' is never closed at line 1, column 6");
    }

    #[test]
    fn test_indentation_mixed_across_lines() {
        let source = "def f():\n\treturn 1\n\ndef g():\n    return 2\n";
        let err = ConsistentIndentationRule
            .check(source, &PythonRuntime)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 2 indents with tabs but line 5 indents with spaces"
        );
    }

    #[test]
    fn test_indentation_mixed_on_one_line() {
        let err = ConsistentIndentationRule
            .check("if x:\n \tpass\n", &PythonRuntime)
            .unwrap_err();
        assert_eq!(err.to_string(), "Line 2 indents with both tabs and spaces");
    }

    #[test]
    fn test_indentation_ignored_for_free_form_languages() {
        let source = "function f() {\n\treturn 1;\n}\nfunction g() {\n  return 2;\n}\n";
        assert!(ConsistentIndentationRule.check(source, &NodeRuntime).is_ok());
    }

    #[parameterized(
        python = { "password = 'hunter2hunter2'\n" },
        javascript = { "const apiKey = \"sk_live_0123456789\";\n" },
        ruby_hash = { "config = { secret_token: 'abcdefgh12' }\n" },
        json_style = { "{\"auth_token\": \"0123456789abcdef\"}\n" },
        screaming_case = { "SECRET_KEY = 'django-insecure-0123'\n" },
        after_plain_assignment = { "name = 'deploychain'\ndb_password = 'correcthorse'\n" },
    )]
    fn test_hardcoded_secret_rejected(source: &str) {
        let err = HardcodedSecretRule.check(source, &PythonRuntime).unwrap_err();
        assert!(err.to_string().starts_with("Hard-coded credential assigned to"));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[parameterized(
        env_lookup = { "password = os.environ['DB_PASSWORD']\n" },
        short_value = { "token = 'abc'\n" },
        comparison = { "if password == 'hunter2hunter2':\n    pass\n" },
        unrelated = { "greeting = 'hello world, friend'\n" },
        tokenizer = { "tokenizer_name = \"bert-base-uncased\"\n" },
        secretary = { "secretary = \"Jane_Doe_Smith\"\n" },
        max_tokens = { "max_tokens = \"12345678\"\n" },
        camel_case_prefix = { "const tokenizerPath = 'models/bert.json';\n" },
    )]
    fn test_hardcoded_secret_accepted(source: &str) {
        assert!(HardcodedSecretRule.check(source, &PythonRuntime).is_ok());
    }

    #[test]
    fn test_hardcoded_secret_reports_credential_name() {
        let source = "model = 'bert-base-uncased'\napi_key = 'sk_live_0123456789'\n";
        let err = HardcodedSecretRule.check(source, &PythonRuntime).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Hard-coded credential assigned to 'api_key' at line 2, column 1"
        );
    }

    #[parameterized(
        javascript_regex_quote = { &NodeRuntime as &dyn Runtime, "console.log(s.replace(/\"/g, ''));\n" },
        javascript_regex_class = { &NodeRuntime as &dyn Runtime, "const re = /[/\"]/;\n" },
        ruby_heredoc = { &RubyRuntime as &dyn Runtime, "puts <<~EOS\n  It's fine\nEOS\n" },
        ruby_percent_literal = { &RubyRuntime as &dyn Runtime, "puts %q(it's)\n" },
        ruby_regex = { &RubyRuntime as &dyn Runtime, "puts 'quoted' if ARGV.first =~ /'/\n" },
    )]
    fn test_balanced_delimiters_skip_literals(runtime: &dyn Runtime, source: &str) {
        assert!(BalancedDelimitersRule.check(source, runtime).is_ok());
    }
}
