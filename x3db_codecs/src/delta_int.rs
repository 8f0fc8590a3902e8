use tracing::debug;

use x3db_core::codec::{ArrayCodec, ArrayKind, TypedArray};
use x3db_core::{EncodingError, UsageError};

use crate::zlib::{deflate, inflate};

/// Algorithm URI declared in document headers.
pub const DELTA_ZLIB_INT_URI: &str = "encoder://web3d.org/DeltazlibIntArrayEncoder";

/// Number of leading elements examined for a sentinel stride.
pub const STRIDE_SNIFF_WINDOW: usize = 20;

/// Index-list terminator, as in `coordIndex="0 1 2 -1 2 3 0 -1"`.
pub const SENTINEL: i32 = -1;

/// `i32 elementCount` + `u8 stride`.
const BLOCK_HEADER_SIZE: usize = 5;

const NAME: &str = "delta-zlib-int";

/// Integer array codec: optional fixed-stride delta, then zlib.
///
/// # Block layout
/// ```text
/// [i32 BE elementCount][u8 stride][zlib payload]
/// ```
/// The payload inflates to `elementCount` big-endian `i32` words. Each word is
/// the element itself (stride 0) or its difference from the element `stride`
/// positions earlier (stride > 0), biased by +1. All arithmetic wraps, so the
/// round trip is exact for every `i32`.
///
/// Index lists (`coordIndex` and friends) of uniform polygons carry a `-1`
/// every N elements; delta against the same corner of the previous polygon
/// turns them into small numbers that compress well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerArrayCodec;

impl IntegerArrayCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_ints(&self, data: &[i32]) -> Result<Vec<u8>, EncodingError> {
        let count = i32::try_from(data.len()).map_err(|_| UsageError::TooLong {
            what: "int32 array",
            len: data.len(),
            max: i32::MAX as usize,
        })?;
        let stride = detect_stride(data);

        let mut raw = Vec::with_capacity(data.len() * 4);
        if stride == 0 {
            for &v in data {
                raw.extend_from_slice(&v.wrapping_add(1).to_be_bytes());
            }
        } else {
            let mut last = vec![0i32; stride];
            for (i, &v) in data.iter().enumerate() {
                let slot = &mut last[i % stride];
                let delta = v.wrapping_sub(*slot);
                *slot = v;
                raw.extend_from_slice(&delta.wrapping_add(1).to_be_bytes());
            }
        }

        let payload = deflate(NAME, &raw)?;
        let mut block = Vec::with_capacity(BLOCK_HEADER_SIZE + payload.len());
        block.extend_from_slice(&count.to_be_bytes());
        block.push(stride as u8);
        block.extend_from_slice(&payload);

        debug!(elements = data.len(), stride, bytes = block.len(), "delta-zlib int block encoded");
        Ok(block)
    }

    pub fn decode_ints(&self, block: &[u8]) -> Result<Vec<i32>, EncodingError> {
        if block.len() < BLOCK_HEADER_SIZE {
            return Err(EncodingError::malformed(
                NAME,
                format!("block is {} bytes, shorter than its header", block.len()),
            ));
        }
        let count = i32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let count = usize::try_from(count)
            .map_err(|_| EncodingError::malformed(NAME, format!("negative element count {count}")))?;
        let stride = usize::from(block[4]);
        let expected = count
            .checked_mul(4)
            .ok_or_else(|| EncodingError::malformed(NAME, "element count overflows"))?;

        let raw = inflate(NAME, &block[BLOCK_HEADER_SIZE..], expected, expected)?;
        if raw.len() != expected {
            return Err(EncodingError::malformed(
                NAME,
                format!("payload holds {} bytes, header declares {count} elements", raw.len()),
            ));
        }

        let mut values: Vec<i32> = raw
            .chunks_exact(4)
            .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]).wrapping_sub(1))
            .collect();
        if stride > 0 {
            for i in stride..values.len() {
                values[i] = values[i].wrapping_add(values[i - stride]);
            }
        }

        debug!(elements = count, stride, bytes = block.len(), "delta-zlib int block decoded");
        Ok(values)
    }
}

/// Find the sentinel stride in the first [`STRIDE_SNIFF_WINDOW`] elements.
///
/// The first `-1` at index `p` proposes stride `p + 1`. It is accepted only if
/// every index `i` in the window holds `-1` exactly when `(i + 1) % stride == 0`.
/// Returns 0 (no delta) otherwise.
pub fn detect_stride(data: &[i32]) -> usize {
    let window = &data[..data.len().min(STRIDE_SNIFF_WINDOW)];
    let Some(first) = window.iter().position(|&v| v == SENTINEL) else {
        return 0;
    };
    let stride = first + 1;
    let regular = window
        .iter()
        .enumerate()
        .all(|(i, &v)| (v == SENTINEL) == ((i + 1) % stride == 0));
    if regular {
        stride
    } else {
        0
    }
}

impl ArrayCodec for IntegerArrayCodec {
    fn uri(&self) -> &'static str {
        DELTA_ZLIB_INT_URI
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ArrayKind {
        ArrayKind::Int32
    }

    fn encode(&self, array: &TypedArray) -> Result<Vec<u8>, EncodingError> {
        match array {
            TypedArray::Int32(data) => self.encode_ints(data),
            other => Err(UsageError::WrongArrayKind {
                algorithm: NAME,
                expected: ArrayKind::Int32,
                found: other.kind(),
            }
            .into()),
        }
    }

    fn decode(&self, block: &[u8]) -> Result<TypedArray, EncodingError> {
        self.decode_ints(block).map(TypedArray::Int32)
    }
}
