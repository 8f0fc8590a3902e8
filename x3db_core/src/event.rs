//! Structural events exchanged between the engine and scene code.

use crate::codec::TypedArray;
use crate::error::ParseError;

/// An element or attribute name as it appeared in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name<'a> {
    /// Vocabulary index, or `None` for a literal name.
    pub index: Option<usize>,
    pub local: &'a str,
}

impl<'a> Name<'a> {
    pub fn indexed(index: usize, local: &'a str) -> Self {
        Self {
            index: Some(index),
            local,
        }
    }

    pub fn literal(local: &'a str) -> Self {
        Self { index: None, local }
    }
}

/// Attribute value after decoding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttributeValue {
    Text(String),
    Boolean(bool),
    /// Content of an encoded array block.
    Array(TypedArray),
}

impl From<TypedArray> for AttributeValue {
    fn from(array: TypedArray) -> Self {
        Self::Array(array)
    }
}

impl From<&str> for AttributeValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'a> {
    pub name: Name<'a>,
    pub value: AttributeValue,
}

/// Consumer of decode events.
///
/// Events arrive in document order on the parsing thread. Returning an error
/// aborts the parse; the error is propagated to the caller unchanged.
pub trait DocumentHandler {
    fn start_document(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    fn start_element(&mut self, name: Name<'_>, attributes: &[Attribute<'_>])
        -> Result<(), ParseError>;

    fn characters(&mut self, _text: &str) -> Result<(), ParseError> {
        Ok(())
    }

    fn end_element(&mut self, name: Name<'_>) -> Result<(), ParseError>;

    fn end_document(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}
