use tracing::debug;

use x3db_core::codec::{ArrayCodec, ArrayKind, TypedArray};
use x3db_core::format::MAX_BLOCK_BYTES;
use x3db_core::{EncodingError, UsageError};

use crate::quantize::{dequantize, mantissa_bits_for, quantize, MAX_MANTISSA_BITS};
use crate::zlib::{deflate, inflate};

/// Algorithm URI declared in document headers (format version 2).
pub const QUANTIZED_ZLIB_FLOAT_URI: &str = "encoder://web3d.org/QuantizedzlibFloatArrayEncoder2";

/// Below single-precision noise for unit-scale coordinates.
pub const DEFAULT_TOLERANCE: f32 = 9.0e-7;

/// `u8 mantissaBits` + `u32 elementCount`, inside the compressed stream.
const INNER_HEADER_SIZE: usize = 5;

const NAME: &str = "quantize-zlib-float";

/// Float array codec: mantissa quantization within a tolerance, then zlib.
///
/// # Block layout (version 2)
/// The whole block is one zlib stream; nothing precedes it:
/// ```text
/// zlib( [u8 mantissaBits][u32 BE elementCount][elementCount × u32 BE word] )
/// ```
/// See [`crate::quantize`] for the word format. Every decoded element is
/// within `tolerance` of its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatArrayCodec {
    tolerance: f32,
}

impl Default for FloatArrayCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatArrayCodec {
    /// Codec using [`DEFAULT_TOLERANCE`].
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Codec with an explicit absolute tolerance. Negative or NaN is rejected.
    pub fn with_tolerance(tolerance: f32) -> Result<Self, UsageError> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(UsageError::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn encode_floats(&self, data: &[f32]) -> Result<Vec<u8>, EncodingError> {
        let count = u32::try_from(data.len()).map_err(|_| UsageError::TooLong {
            what: "float32 array",
            len: data.len(),
            max: u32::MAX as usize,
        })?;
        let bits = mantissa_bits_for(data, self.tolerance);

        let mut raw = Vec::with_capacity(INNER_HEADER_SIZE + data.len() * 4);
        raw.push(bits);
        raw.extend_from_slice(&count.to_be_bytes());
        for &v in data {
            raw.extend_from_slice(&quantize(v, bits).to_be_bytes());
        }

        let block = deflate(NAME, &raw)?;
        debug!(
            elements = data.len(),
            mantissa_bits = bits,
            tolerance = self.tolerance,
            bytes = block.len(),
            "quantize-zlib float block encoded"
        );
        Ok(block)
    }

    pub fn decode_floats(&self, block: &[u8]) -> Result<Vec<f32>, EncodingError> {
        let raw = inflate(NAME, block, block.len().saturating_mul(4), MAX_BLOCK_BYTES)?;
        if raw.len() < INNER_HEADER_SIZE {
            return Err(EncodingError::malformed(
                NAME,
                format!("payload is {} bytes, shorter than its header", raw.len()),
            ));
        }
        let bits = raw[0];
        if bits > MAX_MANTISSA_BITS {
            return Err(EncodingError::malformed(
                NAME,
                format!("mantissa width {bits} exceeds {MAX_MANTISSA_BITS}"),
            ));
        }
        let count = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]) as usize;
        let words = &raw[INNER_HEADER_SIZE..];
        if words.len() != count.saturating_mul(4) {
            return Err(EncodingError::malformed(
                NAME,
                format!("payload holds {} bytes, header declares {count} elements", words.len()),
            ));
        }

        let values: Vec<f32> = words
            .chunks_exact(4)
            .map(|w| dequantize(u32::from_be_bytes([w[0], w[1], w[2], w[3]]), bits))
            .collect();
        debug!(elements = count, mantissa_bits = bits, bytes = block.len(), "quantize-zlib float block decoded");
        Ok(values)
    }
}

impl ArrayCodec for FloatArrayCodec {
    fn uri(&self) -> &'static str {
        QUANTIZED_ZLIB_FLOAT_URI
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ArrayKind {
        ArrayKind::Float32
    }

    fn encode(&self, array: &TypedArray) -> Result<Vec<u8>, EncodingError> {
        match array {
            TypedArray::Float32(data) => self.encode_floats(data),
            other => Err(UsageError::WrongArrayKind {
                algorithm: NAME,
                expected: ArrayKind::Float32,
                found: other.kind(),
            }
            .into()),
        }
    }

    fn decode(&self, block: &[u8]) -> Result<TypedArray, EncodingError> {
        self.decode_floats(block).map(TypedArray::Float32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_validation() {
        assert_eq!(FloatArrayCodec::new().tolerance(), DEFAULT_TOLERANCE);
        assert_eq!(FloatArrayCodec::with_tolerance(0.0).unwrap().tolerance(), 0.0);
        assert_eq!(
            FloatArrayCodec::with_tolerance(-0.5),
            Err(UsageError::InvalidTolerance(-0.5))
        );
        assert!(FloatArrayCodec::with_tolerance(f32::NAN).is_err());
    }

    #[test]
    fn block_is_a_bare_zlib_stream() {
        let block = FloatArrayCodec::new().encode_floats(&[1.0, 2.0, 3.0]).unwrap();
        // zlib CMF byte for deflate with a 32K window
        assert_eq!(block[0], 0x78);
        let raw = inflate(NAME, &block, 64, 64).unwrap();
        assert_eq!(raw.len(), INNER_HEADER_SIZE + 12);
        assert_eq!(&raw[1..5], &3u32.to_be_bytes());
    }

    #[test]
    fn exact_at_zero_tolerance() {
        let codec = FloatArrayCodec::with_tolerance(0.0).unwrap();
        let data = [0.1f32, -0.0, 1e-40, f32::MAX, f32::MIN, 123.456];
        let decoded = codec.decode_floats(&codec.encode_floats(&data).unwrap()).unwrap();
        for (a, b) in data.iter().zip(&decoded) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn coarse_tolerance_shrinks_output() {
        let data: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.013).sin()).collect();
        let fine = FloatArrayCodec::with_tolerance(0.0).unwrap().encode_floats(&data).unwrap();
        let coarse_codec = FloatArrayCodec::with_tolerance(1e-3).unwrap();
        let coarse = coarse_codec.encode_floats(&data).unwrap();
        assert!(coarse.len() < fine.len(), "coarse={} fine={}", coarse.len(), fine.len());
        let decoded = coarse_codec.decode_floats(&coarse).unwrap();
        for (a, b) in data.iter().zip(&decoded) {
            assert!((f64::from(*a) - f64::from(*b)).abs() <= 1e-3);
        }
    }

    #[test]
    fn rejects_int_input() {
        let err = FloatArrayCodec::new().encode(&TypedArray::Int32(vec![1])).unwrap_err();
        assert!(matches!(err, EncodingError::Usage(UsageError::WrongArrayKind { .. })));
    }

    #[test]
    fn malformed_payloads() {
        let codec = FloatArrayCodec::new();
        let short = deflate(NAME, &[5, 0, 0]).unwrap();
        assert!(matches!(codec.decode_floats(&short), Err(EncodingError::Malformed { .. })));

        let wide = deflate(NAME, &[24, 0, 0, 0, 0]).unwrap();
        assert!(matches!(codec.decode_floats(&wide), Err(EncodingError::Malformed { .. })));

        let miscounted = deflate(NAME, &[23, 0, 0, 0, 2, 0, 0, 0, 0]).unwrap();
        assert!(matches!(codec.decode_floats(&miscounted), Err(EncodingError::Malformed { .. })));
    }

    #[test]
    fn highly_compressible_blocks_decode() {
        let codec = FloatArrayCodec::new();
        let uniform = vec![0.5f32; 1000];
        let block = codec.encode_floats(&uniform).unwrap();
        assert!(block.len() * 4 < uniform.len() * std::mem::size_of::<f32>());
        assert_eq!(codec.decode_floats(&block).unwrap(), uniform);

        let grid: Vec<f32> = (0..200_000).map(|i| (i % 64) as f32).collect();
        assert_eq!(codec.decode_floats(&codec.encode_floats(&grid).unwrap()).unwrap(), grid);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let codec = FloatArrayCodec::new();
        let mut block = codec.encode_floats(&[1.0, 2.0]).unwrap();
        block.extend_from_slice(b"GARBAGE");
        assert!(matches!(codec.decode_floats(&block), Err(EncodingError::Malformed { .. })));
    }
}
