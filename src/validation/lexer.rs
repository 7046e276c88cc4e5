//! Delimiter scanner
//!
//! Walks source text once, skipping comments and literals according to the
//! language's [`LexicalProfile`], and reports the first structural problem:
//! an unterminated literal or comment, or brackets that do not pair up.
//!
//! Regex literals and percent literals are recognised heuristically. When one
//! cannot be closed on its own terms the scanner treats the opening character
//! as an operator instead of reporting it.

use crate::stack::{LexicalProfile, StringDelimiter};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    UnterminatedString { delimiter: &'static str },
    UnterminatedBlockComment { open: &'static str },
    UnexpectedClosing { found: char },
    MismatchedClosing { expected: char, found: char },
    Unclosed { open: char },
}

/// Structural problem with a 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub kind: IssueKind,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::UnterminatedString { delimiter } => {
                write!(f, "unterminated string literal opened with {}", delimiter)?
            }
            IssueKind::UnterminatedBlockComment { open } => {
                write!(f, "unterminated block comment opened with {}", open)?
            }
            IssueKind::UnexpectedClosing { found } => {
                write!(f, "unexpected closing '{}'", found)?
            }
            IssueKind::MismatchedClosing { expected, found } => {
                write!(f, "expected '{}' but found '{}'", expected, found)?
            }
            IssueKind::Unclosed { open } => write!(f, "'{}' is never closed", open)?,
        }
        write!(f, " at line {}, column {}", self.line, self.column)
    }
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advances over `text`, which must be a prefix of the remaining input
    fn skip(&mut self, text: &str) {
        for _ in text.chars() {
            self.bump();
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

/// Heredoc whose body starts on the line after its opener
struct PendingHeredoc {
    terminator: String,
    indented: bool,
    line: usize,
    column: usize,
}

/// Returns the first structural issue in `source`, if any
pub fn scan(source: &str, profile: &LexicalProfile) -> Option<SyntaxIssue> {
    let mut cursor = Cursor::new(source);
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut heredocs: Vec<PendingHeredoc> = Vec::new();

    while let Some(ch) = cursor.peek() {
        let rest = cursor.rest();
        let (line, column) = cursor.position();
        let issue = |kind| Some(SyntaxIssue { kind, line, column });

        if profile.line_comments.iter().any(|c| rest.starts_with(c)) {
            while matches!(cursor.peek(), Some(c) if c != '\n') {
                cursor.bump();
            }
            continue;
        }

        if let Some((start, end)) = profile.block_comment {
            if rest.starts_with(start) {
                cursor.skip(start);
                if !skip_until(&mut cursor, end) {
                    return issue(IssueKind::UnterminatedBlockComment { open: start });
                }
                continue;
            }
        }

        if profile.heredocs && rest.starts_with("<<") {
            if let Some((opener, terminator, indented)) = heredoc_opener(rest) {
                cursor.skip(opener);
                heredocs.push(PendingHeredoc {
                    terminator,
                    indented,
                    line,
                    column,
                });
                continue;
            }
        }

        if profile.percent_literals && ch == '%' {
            if let Some(len) = percent_literal_len(rest) {
                cursor.skip(&rest[..len]);
                continue;
            }
        }

        if let Some(delimiter) = profile.strings.iter().find(|d| rest.starts_with(d.open)) {
            cursor.skip(delimiter.open);
            if !skip_string(&mut cursor, delimiter) {
                return issue(IssueKind::UnterminatedString {
                    delimiter: delimiter.open,
                });
            }
            continue;
        }

        if profile.regex_literals && ch == '/' && regex_allowed(&source[..cursor.offset]) {
            if let Some(len) = regex_literal_len(rest) {
                cursor.skip(&rest[..len]);
                continue;
            }
        }

        cursor.bump();
        match ch {
            '\n' => {
                for heredoc in heredocs.drain(..) {
                    if !skip_heredoc_body(&mut cursor, &heredoc) {
                        return Some(unterminated_heredoc(&heredoc));
                    }
                }
            }
            '\\' => {
                cursor.bump();
            }
            '(' | '[' | '{' => open.push((ch, line, column)),
            ')' | ']' | '}' => match open.pop() {
                None => return issue(IssueKind::UnexpectedClosing { found: ch }),
                Some((opener, _, _)) => {
                    let expected = closing_for(opener).unwrap_or(ch);
                    if expected != ch {
                        return issue(IssueKind::MismatchedClosing { expected, found: ch });
                    }
                }
            },
            _ => {}
        }
    }

    if let Some(heredoc) = heredocs.first() {
        return Some(unterminated_heredoc(heredoc));
    }

    open.pop().map(|(opener, line, column)| SyntaxIssue {
        kind: IssueKind::Unclosed { open: opener },
        line,
        column,
    })
}

fn unterminated_heredoc(heredoc: &PendingHeredoc) -> SyntaxIssue {
    SyntaxIssue {
        kind: IssueKind::UnterminatedString { delimiter: "<<" },
        line: heredoc.line,
        column: heredoc.column,
    }
}

fn heredoc_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^<<([~-]?)(?:'([A-Za-z_]\w*)'|"([A-Za-z_]\w*)"|([A-Za-z_]\w*))"#)
            .expect("valid regex")
    })
}

/// Matches `<<~ID`, `<<-ID`, `<<'ID'` or `<<ID`; a bare identifier without
/// `~`/`-` must be upper case so `list <<item` stays an append
fn heredoc_opener(rest: &str) -> Option<(&str, String, bool)> {
    let caps = heredoc_pattern().captures(rest)?;
    let indented = !caps[1].is_empty();
    let (terminator, quoted) = match (caps.get(2).or_else(|| caps.get(3)), caps.get(4)) {
        (Some(quoted), _) => (quoted.as_str(), true),
        (None, Some(bare)) => (bare.as_str(), false),
        (None, None) => return None,
    };
    if !indented
        && !quoted
        && !terminator
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return None;
    }
    let opener = caps.get(0)?.as_str();
    Some((opener, terminator.to_string(), indented))
}

/// Advances past the heredoc body and its terminator line
fn skip_heredoc_body(cursor: &mut Cursor<'_>, heredoc: &PendingHeredoc) -> bool {
    while cursor.peek().is_some() {
        let rest = cursor.rest();
        let line = rest.split('\n').next().unwrap_or_default();
        let candidate = if heredoc.indented {
            line.trim()
        } else {
            line.trim_end()
        };
        cursor.skip(line);
        cursor.bump();
        if candidate == heredoc.terminator {
            return true;
        }
    }
    false
}

fn closing_delimiter(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}

/// Byte length of a `%q(..)`-style literal at the start of `rest`
fn percent_literal_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    chars.next();
    let (_, kind) = chars.next()?;
    if !"qQwWiIrsx".contains(kind) {
        return None;
    }
    let (_, open) = chars.next()?;
    if open.is_alphanumeric() || open.is_whitespace() {
        return None;
    }
    let close = closing_delimiter(open);
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == close && depth == 0 {
            return Some(i + c.len_utf8());
        } else if c == close {
            depth -= 1;
        } else if c == open && open != close {
            depth += 1;
        }
    }
    None
}

const REGEX_PRECEDERS: &str = "(,=:[!&|?{};+-*%<>~^";

const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "if",
    "elsif",
    "unless",
    "while",
    "until",
    "when",
    "and",
    "or",
    "not",
];

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether a `/` following `before` starts an operand rather than dividing
fn regex_allowed(before: &str) -> bool {
    let trimmed = before.trim_end();
    match trimmed.chars().last() {
        None => true,
        Some(c) if REGEX_PRECEDERS.contains(c) => true,
        Some(c) if is_identifier_char(c) => {
            let start = trimmed
                .char_indices()
                .rev()
                .find(|(_, c)| !is_identifier_char(*c))
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            REGEX_KEYWORDS.contains(&&trimmed[start..])
        }
        _ => false,
    }
}

/// Byte length of a single-line `/pattern/` at the start of `rest`
fn regex_literal_len(rest: &str) -> Option<usize> {
    let mut in_class = false;
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' => return None,
            '\\' => {
                if matches!(chars.next(), None | Some((_, '\n'))) {
                    return None;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn skip_until(cursor: &mut Cursor<'_>, end: &str) -> bool {
    while cursor.peek().is_some() {
        if cursor.rest().starts_with(end) {
            cursor.skip(end);
            return true;
        }
        cursor.bump();
    }
    false
}

fn skip_string(cursor: &mut Cursor<'_>, delimiter: &StringDelimiter) -> bool {
    while let Some(ch) = cursor.peek() {
        if cursor.rest().starts_with(delimiter.close) {
            cursor.skip(delimiter.close);
            return true;
        }
        if ch == '\n' && !delimiter.multiline {
            return false;
        }
        cursor.bump();
        if ch == '\\' && delimiter.escapes {
            cursor.bump();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::runtime::{GoRuntime, NodeRuntime, PythonRuntime, RubyRuntime, Runtime};
    use yare::parameterized;

    fn python(source: &str) -> Option<SyntaxIssue> {
        scan(source, &PythonRuntime.lexical_profile())
    }

    #[test]
    fn test_balanced_python() {
        assert_eq!(python("print('hi')\n"), None);
        assert_eq!(python("data = {'a': [1, (2, 3)]}\n"), None);
    }

    #[test]
    fn test_brackets_inside_strings_and_comments_are_ignored() {
        assert_eq!(python("print(')')  # (\n"), None);
        assert_eq!(python("doc = \"\"\"\n(unbalanced\n\"\"\"\n"), None);
    }

    #[test]
    fn test_unclosed_paren_reports_opening_position() {
        let issue = python("x = 1\nprint('hi'\n").unwrap();
        assert_eq!(issue.kind, IssueKind::Unclosed { open: '(' });
        assert_eq!((issue.line, issue.column), (2, 6));
        assert_eq!(issue.to_string(), "'(' is never closed at line 2, column 6");
    }

    #[test]
    fn test_mismatched_closing() {
        let issue = python("items = [1, 2)\n").unwrap();
        assert_eq!(
            issue.kind,
            IssueKind::MismatchedClosing {
                expected: ']',
                found: ')'
            }
        );
        assert_eq!((issue.line, issue.column), (1, 14));
    }

    #[test]
    fn test_unexpected_closing() {
        let issue = python("print('hi'))\n").unwrap();
        assert_eq!(issue.kind, IssueKind::UnexpectedClosing { found: ')' });
    }

    #[test]
    fn test_unterminated_single_line_string() {
        let issue = python("print('hi)\nx = 1\n").unwrap();
        assert_eq!(issue.kind, IssueKind::UnterminatedString { delimiter: "'" });
        assert_eq!((issue.line, issue.column), (1, 7));
    }

    #[test]
    fn test_escaped_quote_stays_inside_string() {
        assert_eq!(python("print('it\\'s')\n"), None);
    }

    #[test]
    fn test_javascript_block_comment_and_template() {
        let profile = NodeRuntime.lexical_profile();
        assert_eq!(scan("/* ( */\nconst s = `a\n(b`;\n", &profile), None);

        let issue = scan("/* never closed\n", &profile).unwrap();
        assert_eq!(issue.kind, IssueKind::UnterminatedBlockComment { open: "/*" });
    }

    #[test]
    fn test_go_raw_string_ignores_backslash() {
        let profile = GoRuntime.lexical_profile();
        assert_eq!(scan("var p = `C:\\`\nfunc main() {}\n", &profile), None);
    }

    #[test]
    fn test_ruby_block_comment() {
        let profile = RubyRuntime.lexical_profile();
        assert_eq!(scan("=begin\n(\n=end\nputs 'hi'\n", &profile), None);
    }

    #[test]
    fn test_multibyte_columns() {
        let issue = python("s = 'é'; t = (\n").unwrap();
        assert_eq!((issue.line, issue.column), (1, 14));
    }

    #[parameterized(
        quote_in_regex = { "console.log(s.replace(/\"/g, ''));\n" },
        slash_in_class = { "const re = /[/\"]/;\n" },
        escaped_slash = { "const re = /a\\/'/;\n" },
        after_return = { "function f() {\n  return /'/.test(x);\n}\n" },
        division = { "const x = a / b / c;\n" },
        division_after_call = { "const x = f(a) / g(b);\n" },
        lone_slash = { "const half = total /\n  2;\n" },
    )]
    fn test_javascript_regex_literals(source: &str) {
        assert_eq!(scan(source, &NodeRuntime.lexical_profile()), None);
    }

    #[parameterized(
        squiggly = { "puts <<~EOS\n  It's fine\nEOS\n" },
        dash = { "text = <<-TEXT\n  don't (\n  TEXT\nputs text\n" },
        bare = { "sql = <<SQL\nSELECT ')'\nSQL\n" },
        quoted = { "puts <<~'EOS'\n  #{not_interpolated\nEOS\n" },
        call_after_opener = { "puts(<<~EOS)\n  It's fine\nEOS\n" },
        two_on_one_line = { "f(<<~A, <<~B)\n  a's\nA\n  b's\nB\n" },
        append = { "items = []\nitems <<item\n" },
        percent_q = { "puts %q(it's (nested) fine)\n" },
        percent_w = { "words = %w[it's ok]\n" },
        percent_symbol_delimiter = { "puts %q|it's|\n" },
        modulo = { "puts 7 % 3\n" },
        regex = { "puts 'x' if line =~ /'/\n" },
    )]
    fn test_ruby_literals_accepted(source: &str) {
        assert_eq!(scan(source, &RubyRuntime.lexical_profile()), None);
    }

    #[test]
    fn test_unterminated_heredoc() {
        let profile = RubyRuntime.lexical_profile();
        let issue = scan("x = 1\nputs <<~EOS\n  never closed\n", &profile).unwrap();
        assert_eq!(issue.kind, IssueKind::UnterminatedString { delimiter: "<<" });
        assert_eq!((issue.line, issue.column), (2, 6));

        let issue = scan("puts <<~EOS", &profile).unwrap();
        assert_eq!(issue.kind, IssueKind::UnterminatedString { delimiter: "<<" });
    }

    #[test]
    fn test_python_has_no_regex_literals() {
        assert!(python("x = a /'b'\n").is_none());
        assert!(python("x = (a /'b)\n").is_some());
    }
}
