//! Array compression algorithms for X3DB documents.

mod delta_int;
pub mod quantize;
mod quantized_float;
mod zlib;

pub use delta_int::{detect_stride, IntegerArrayCodec, DELTA_ZLIB_INT_URI, SENTINEL, STRIDE_SNIFF_WINDOW};
pub use quantized_float::{FloatArrayCodec, DEFAULT_TOLERANCE, QUANTIZED_ZLIB_FLOAT_URI};

use x3db_core::codec::{ArrayCodec, ArrayKind, TypedArray};
use x3db_core::{EncodingError, ParseError};

/// Every algorithm URI this crate can resolve, integer codec first.
pub const ALGORITHM_URIS: [&str; 2] = [DELTA_ZLIB_INT_URI, QUANTIZED_ZLIB_FLOAT_URI];

/// The closed set of array algorithms, dispatched without boxing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrayAlgorithm {
    DeltaZlibInt(IntegerArrayCodec),
    QuantizedZlibFloat(FloatArrayCodec),
}

impl ArrayAlgorithm {
    /// Both algorithms with default settings, in [`ALGORITHM_URIS`] order.
    pub fn defaults() -> [Self; 2] {
        [
            Self::DeltaZlibInt(IntegerArrayCodec::new()),
            Self::QuantizedZlibFloat(FloatArrayCodec::new()),
        ]
    }

    fn codec(&self) -> &dyn ArrayCodec {
        match self {
            Self::DeltaZlibInt(c) => c as &dyn ArrayCodec,
            Self::QuantizedZlibFloat(c) => c as &dyn ArrayCodec,
        }
    }
}

impl From<IntegerArrayCodec> for ArrayAlgorithm {
    fn from(codec: IntegerArrayCodec) -> Self {
        Self::DeltaZlibInt(codec)
    }
}

impl From<FloatArrayCodec> for ArrayAlgorithm {
    fn from(codec: FloatArrayCodec) -> Self {
        Self::QuantizedZlibFloat(codec)
    }
}

impl ArrayCodec for ArrayAlgorithm {
    fn uri(&self) -> &'static str {
        self.codec().uri()
    }

    fn name(&self) -> &'static str {
        self.codec().name()
    }

    fn kind(&self) -> ArrayKind {
        self.codec().kind()
    }

    fn encode(&self, array: &TypedArray) -> Result<Vec<u8>, EncodingError> {
        self.codec().encode(array)
    }

    fn decode(&self, block: &[u8]) -> Result<TypedArray, EncodingError> {
        self.codec().decode(block)
    }
}

/// Resolve an algorithm from the URI a document header declares.
///
/// Float decoding does not depend on the tolerance, so the default one is used.
pub fn algorithm_by_uri(uri: &str) -> Result<ArrayAlgorithm, ParseError> {
    match uri {
        DELTA_ZLIB_INT_URI => Ok(IntegerArrayCodec::new().into()),
        QUANTIZED_ZLIB_FLOAT_URI => Ok(FloatArrayCodec::new().into()),
        _ => Err(ParseError::UnknownAlgorithm(uri.to_owned())),
    }
}
