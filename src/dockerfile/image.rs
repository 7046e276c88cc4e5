use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    #[error("Image reference cannot be empty")]
    Empty,

    #[error("Image reference '{0}' contains whitespace")]
    Whitespace(String),

    #[error("Image reference '{0}' has an empty tag")]
    EmptyTag(String),

    #[error("Image reference '{0}' has an invalid digest (expected algorithm:hex)")]
    InvalidDigest(String),
}

/// A container image reference: `name[:tag][@digest]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    pub fn parse(reference: &str) -> Result<Self, ImageRefError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImageRefError::Empty);
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(ImageRefError::Whitespace(reference.to_string()));
        }

        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => {
                let valid = digest
                    .split_once(':')
                    .map(|(algo, hex)| !algo.is_empty() && !hex.is_empty())
                    .unwrap_or(false);
                if !valid {
                    return Err(ImageRefError::InvalidDigest(reference.to_string()));
                }
                (rest, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A colon before the last slash belongs to a registry port, not a tag
        let last_slash = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match rest[last_slash..].rfind(':') {
            Some(offset) => {
                let split = last_slash + offset;
                let tag = &rest[split + 1..];
                if tag.is_empty() {
                    return Err(ImageRefError::EmptyTag(reference.to_string()));
                }
                (&rest[..split], Some(tag.to_string()))
            }
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(ImageRefError::Empty);
        }

        Ok(Self {
            name: name.to_string(),
            tag,
            digest,
        })
    }

    pub fn is_scratch(&self) -> bool {
        self.name == "scratch" && self.tag.is_none() && self.digest.is_none()
    }

    /// Reference still contains a `$VAR` or `${VAR}` build argument
    pub fn is_templated(&self) -> bool {
        self.to_string().contains('$')
    }

    /// Pinned references name a digest or an explicit tag other than `latest`
    pub fn is_pinned(&self) -> bool {
        if self.digest.is_some() {
            return true;
        }
        matches!(&self.tag, Some(tag) if tag != "latest")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
