use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use x3db_core::format::MAX_PREALLOC_BYTES;
use x3db_core::EncodingError;

/// zlib-wrapped DEFLATE at the maximum compression level.
pub(crate) fn deflate(algorithm: &'static str, raw: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2 + 64), Compression::best());
    encoder
        .write_all(raw)
        .map_err(|e| EncodingError::io(algorithm, e))?;
    encoder.finish().map_err(|e| EncodingError::io(algorithm, e))
}

/// Inflate a complete zlib stream.
///
/// The stream must reach its end marker: input that runs out first is an
/// `UnexpectedEof` error rather than a short result. Output beyond `limit`
/// bytes and bytes after the end marker are rejected as malformed.
pub(crate) fn inflate(
    algorithm: &'static str,
    payload: &[u8],
    size_hint: usize,
    limit: usize,
) -> Result<Vec<u8>, EncodingError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(size_hint.min(limit.saturating_add(1)).clamp(64, MAX_PREALLOC_BYTES));

    loop {
        if out.len() == out.capacity() {
            let room = limit.saturating_add(1) - out.len();
            out.reserve(out.capacity().max(4096).min(room));
        }
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&payload[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| EncodingError::io(algorithm, io::Error::new(io::ErrorKind::InvalidData, e)))?;

        if out.len() > limit {
            return Err(EncodingError::malformed(
                algorithm,
                format!("payload inflates past {limit} bytes"),
            ));
        }
        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == consumed
                    && inflater.total_out() == produced
                    && out.len() < out.capacity();
                if stalled {
                    return Err(EncodingError::io(
                        algorithm,
                        io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "deflate stream ends before its end marker",
                        ),
                    ));
                }
            }
        }
    }

    let trailing = payload.len() - inflater.total_in() as usize;
    if trailing != 0 {
        return Err(EncodingError::malformed(
            algorithm,
            format!("{trailing} bytes after the end of the deflate stream"),
        ));
    }
    Ok(out)
}
