use crate::stack::LanguageId;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Source text submitted for containerization, with the language the caller declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSubmission {
    source: String,
    language: LanguageId,
    runtime_version: Option<String>,
    entry_file: Option<String>,
}

impl SourceSubmission {
    pub fn new(source: impl Into<String>, language: LanguageId) -> Self {
        Self {
            source: source.into(),
            language,
            runtime_version: None,
            entry_file: None,
        }
    }

    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    pub fn with_entry_file(mut self, entry_file: impl Into<String>) -> Self {
        self.entry_file = Some(entry_file.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn runtime_version(&self) -> Option<&str> {
        self.runtime_version.as_deref()
    }

    pub fn entry_file(&self) -> Option<&str> {
        self.entry_file.as_deref()
    }

    /// Hex SHA-256 of the source text, used to correlate log lines
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.source.as_bytes()))
    }

    /// First 12 characters of [`digest`](Self::digest)
    pub fn short_digest(&self) -> String {
        let mut digest = self.digest();
        digest.truncate(12);
        digest
    }
}
