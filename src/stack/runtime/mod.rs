use super::LanguageId;
use serde::Serialize;

pub mod go;
pub mod node;
pub mod python;
pub mod ruby;

pub use go::GoRuntime;
pub use node::NodeRuntime;
pub use python::PythonRuntime;
pub use ruby::RubyRuntime;

/// How a string literal opens and closes in a language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringDelimiter {
    pub open: &'static str,
    pub close: &'static str,
    /// Literal may span several lines
    pub multiline: bool,
    /// Backslash escapes the next character
    pub escapes: bool,
}

impl StringDelimiter {
    pub const fn single_line(quote: &'static str) -> Self {
        Self {
            open: quote,
            close: quote,
            multiline: false,
            escapes: true,
        }
    }

    pub const fn multi_line(quote: &'static str) -> Self {
        Self {
            open: quote,
            close: quote,
            multiline: true,
            escapes: true,
        }
    }

    pub const fn raw(quote: &'static str) -> Self {
        Self {
            open: quote,
            close: quote,
            multiline: true,
            escapes: false,
        }
    }
}

/// Comment and string syntax the source validator needs to skip non-code text
#[derive(Debug, Clone, Copy)]
pub struct LexicalProfile {
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Longest delimiters first so `"""` wins over `"`
    pub strings: &'static [StringDelimiter],
    /// `/pattern/` after an operator or keyword is a literal, not division
    pub regex_literals: bool,
    /// `<<~ID`, `<<-ID` and `<<ID` bodies run until the terminator line
    pub heredocs: bool,
    /// `%q(..)`, `%w[..]` and friends with bracket or symbol delimiters
    pub percent_literals: bool,
}

/// Evidence that a submission can be started directly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrypointEvidence {
    pub confidence: f32,
    pub reason: String,
}

impl EntrypointEvidence {
    pub fn new(confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            confidence,
            reason: reason.into(),
        }
    }
}

/// Capabilities of one language runtime: how its source is lexed, which image
/// runs it, how dependencies are installed and how the program is started.
pub trait Runtime: Send + Sync {
    fn language(&self) -> LanguageId;

    fn lexical_profile(&self) -> LexicalProfile;

    /// Whether mixing tabs and spaces in indentation changes program meaning
    fn indentation_sensitive(&self) -> bool {
        false
    }

    fn extensions(&self) -> &[&'static str];

    fn default_entry_file(&self) -> &'static str;

    /// Entry file name to use for this particular source text
    fn entry_file_for(&self, _source: &str) -> &'static str {
        self.default_entry_file()
    }

    fn default_version(&self) -> &'static str;

    /// Pinned base image for the given runtime version
    fn base_image(&self, version: Option<&str>) -> String;

    /// File whose presence in the build context triggers dependency installation
    fn dependency_manifest(&self) -> &'static str;

    fn install_command(&self) -> String;

    /// Compile steps run before the process is started, if any
    fn build_commands(&self, _entry_file: &str) -> Vec<String> {
        vec![]
    }

    /// Exec-form start command
    fn start_command(&self, entry_file: &str) -> Vec<String>;

    /// Scores how likely it is that running the source file directly does something
    fn entrypoint_evidence(&self, source: &str) -> EntrypointEvidence;
}

/// Shell step installing dependencies only when the manifest is present in the context
pub(crate) fn manifest_guarded(manifest: &str, command: &str) -> String {
    format!("if [ -f {} ]; then {}; fi", manifest, command)
}

/// Lines that are neither blank nor comments, with their indentation stripped
pub(crate) fn code_lines<'a>(
    source: &'a str,
    line_comments: &'a [&'a str],
) -> impl Iterator<Item = (bool, &'a str)> + 'a {
    source.lines().filter_map(move |line| {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || line_comments.iter().any(|c| trimmed.starts_with(c)) {
            return None;
        }
        let top_level = trimmed.len() == line.len();
        Some((top_level, trimmed.trim_end()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_guarded() {
        assert_eq!(
            manifest_guarded("requirements.txt", "pip install -r requirements.txt"),
            "if [ -f requirements.txt ]; then pip install -r requirements.txt; fi"
        );
    }

    #[test]
    fn test_code_lines_skips_comments_and_blanks() {
        let source = "# header\n\nimport os\n    print(os)\n";
        let lines: Vec<_> = code_lines(source, &["#"]).collect();
        assert_eq!(lines, vec![(true, "import os"), (false, "print(os)")]);
    }
}
