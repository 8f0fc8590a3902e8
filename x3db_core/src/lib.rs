//! Binary tree-document engine for X3DB scene files.
//!
//! The engine knows nothing about X3D itself: scene code plugs in a
//! [`Vocabulary`] and a set of [`ArrayCodec`] algorithms, then drives a
//! [`Reader`] or [`Writer`] with structural events.

pub mod codec;
pub mod error;
pub mod event;
pub mod format;
pub mod reader;
pub mod vocabulary;
pub mod writer;

pub use codec::{ArrayCodec, ArrayKind, TypedArray};
pub use error::{EncodingError, ParseError, UsageError, VocabularyError, WriteError};
pub use event::{Attribute, AttributeValue, DocumentHandler, Name};
pub use format::{DocumentHeader, MAGIC, VERSION};
pub use reader::Reader;
pub use vocabulary::{NameTable, TableKind, Vocabulary};
pub use writer::Writer;
