use std::fmt;

use thiserror::Error;

use x3db_core::{ParseError, UsageError, VocabularyError, WriteError};

/// A document failed to decode. Carries the source location when the caller
/// supplied one.
#[derive(Debug, Error)]
pub struct DocumentParseError {
    pub url: Option<String>,
    #[source]
    pub source: ParseError,
}

impl fmt::Display for DocumentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "failed to parse X3D binary document {url}: {}", self.source),
            None => write!(f, "failed to parse X3D binary document: {}", self.source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Parse(#[from] DocumentParseError),

    #[error("failed to write X3D binary document: {0}")]
    Write(#[from] WriteError),

    #[error("X3D vocabulary bootstrap failed: {0}")]
    Vocabulary(#[from] VocabularyError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}
