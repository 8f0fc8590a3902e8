use std::fmt;

use crate::error::EncodingError;

/// Element type of a typed array block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    Int32,
    Float32,
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int32 => "int32",
            Self::Float32 => "float32",
        })
    }
}

/// A fully materialized typed array, as handed to and produced by an [`ArrayCodec`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TypedArray {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
}

impl TypedArray {
    pub fn kind(&self) -> ArrayKind {
        match self {
            Self::Int32(_) => ArrayKind::Int32,
            Self::Float32(_) => ArrayKind::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Array compression abstraction.
///
/// Each `ArrayCodec` implementation:
/// - Is identified by a stable algorithm URI declared in the document header.
/// - Encodes one typed array into a self-contained block and decodes it back;
///   no state is carried from one block to the next.
/// - Accepts exactly one [`ArrayKind`]. Handing it another kind is a usage
///   error, not a data error.
pub trait ArrayCodec: Send + Sync {
    /// Stable algorithm URI stored in the document header.
    fn uri(&self) -> &'static str;

    /// Short human-readable name for logs and CLI display.
    fn name(&self) -> &'static str;

    /// The array kind this algorithm encodes.
    fn kind(&self) -> ArrayKind;

    /// Encode a whole array into one block.
    fn encode(&self, array: &TypedArray) -> Result<Vec<u8>, EncodingError>;

    /// Decode one block produced by [`ArrayCodec::encode`].
    fn decode(&self, block: &[u8]) -> Result<TypedArray, EncodingError>;
}
