//! Error types shared by the engine and the array codecs.

use std::io;

use thiserror::Error;

use crate::codec::ArrayKind;
use crate::vocabulary::TableKind;

/// Vocabulary bootstrap failures. Both are fatal: the table is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("{table} name {name:?} is already registered at index {existing}")]
    Collision {
        table: TableKind,
        name: String,
        existing: usize,
    },

    #[error("{table} table is full ({capacity} entries)")]
    Full { table: TableKind, capacity: usize },
}

/// Caller broke a precondition. These are programming errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("{algorithm} encodes {expected} arrays, got {found}")]
    WrongArrayKind {
        algorithm: &'static str,
        expected: ArrayKind,
        found: ArrayKind,
    },

    #[error("quantization tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f32),

    #[error("container codec used before initialize()")]
    NotInitialized,

    #[error("end_element called with no open element")]
    UnbalancedEnd,

    #[error("finish called with {0} element(s) still open")]
    UnclosedElements(usize),

    #[error("no registered algorithm encodes {0} arrays")]
    NoAlgorithm(ArrayKind),

    #[error("document has {0} algorithms; at most 255 fit in the header")]
    TooManyAlgorithms(usize),

    #[error("{what} is {len} bytes; the format allows at most {max}")]
    TooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },
}

/// Failure inside an array algorithm while encoding or decoding one block.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("{algorithm}: {source}")]
    Io {
        algorithm: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{algorithm}: malformed block: {reason}")]
    Malformed {
        algorithm: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl EncodingError {
    pub fn io(algorithm: &'static str, source: io::Error) -> Self {
        Self::Io { algorithm, source }
    }

    pub fn malformed(algorithm: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            algorithm,
            reason: reason.into(),
        }
    }
}

/// Failure while reading a whole document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid X3DB magic bytes; not an X3DB document")]
    BadMagic,

    #[error("unsupported X3DB version {0} (only version 1 is supported)")]
    UnsupportedVersion(u8),

    #[error("document declares unregistered vocabulary {0:?}")]
    UnknownVocabulary(String),

    #[error("document declares unregistered encoding algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("unknown {what} 0x{tag:02x} at byte {offset}")]
    UnknownTag {
        what: &'static str,
        tag: u8,
        offset: u64,
    },

    #[error("{table} index {index} is out of range at byte {offset}")]
    IndexOutOfRange {
        table: TableKind,
        index: usize,
        offset: u64,
    },

    #[error("algorithm index {index} is out of range (document declares {declared})")]
    AlgorithmOutOfRange { index: usize, declared: usize },

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("{what} length {len} exceeds limit {max}")]
    TooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unbalanced element structure: {0}")]
    Unbalanced(&'static str),

    #[error("checksum mismatch: trailer says {expected:016x}, computed {computed:016x}")]
    ChecksumMismatch { expected: u64, computed: u64 },

    #[error("unexpected data after end of document")]
    TrailingData,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("document rejected by handler: {0}")]
    Rejected(String),
}

/// Failure while writing a document.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}
