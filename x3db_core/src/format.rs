use crate::error::UsageError;

/// Magic bytes opening every X3DB document.
/// 6 bytes: "X3DB" followed by CR LF, so text-mode transfers are caught early.
pub const MAGIC: &[u8; 6] = b"X3DB\r\n";

/// Current document format version.
pub const VERSION: u8 = 1;

/// Fixed-size part of the document header in bytes.
///   magic[6] + version:u8 + flags:u8 = 8
/// The vocabulary URI and the algorithm URI table follow it.
pub const FIXED_HEADER_SIZE: usize = 8;

/// Size of the checksum trailer written after `END_DOCUMENT`.
pub const TRAILER_SIZE: usize = 8;

// ── Flags ──────────────────────────────────────────────────────────────────

/// The document ends with an xxhash3-64 of every preceding byte.
pub const FLAG_HAS_CHECKSUM: u8 = 1 << 0;

// ── Body opcodes ───────────────────────────────────────────────────────────

pub const OP_END_DOCUMENT: u8 = 0x00;
pub const OP_START_ELEMENT_INDEXED: u8 = 0x01;
pub const OP_START_ELEMENT_LITERAL: u8 = 0x02;
pub const OP_END_ELEMENT: u8 = 0x03;
pub const OP_CHARACTERS: u8 = 0x04;

// ── Attribute tags ─────────────────────────────────────────────────────────

pub const NAME_INDEXED: u8 = 0x00;
pub const NAME_LITERAL: u8 = 0x01;

pub const VALUE_TEXT: u8 = 0x00;
pub const VALUE_TABLE: u8 = 0x01;
pub const VALUE_ENCODED: u8 = 0x02;
pub const VALUE_BOOLEAN: u8 = 0x03;

// ── Limits ─────────────────────────────────────────────────────────────────

/// Longest string (name, text value, character run) accepted by the reader.
pub const MAX_STRING_BYTES: usize = 16 * 1024 * 1024;

/// Largest single encoded array block accepted by the reader.
pub const MAX_BLOCK_BYTES: usize = 1024 * 1024 * 1024;

/// Algorithm indices are a single byte on the wire.
pub const MAX_ALGORITHMS: usize = u8::MAX as usize;

/// Upper bound on speculative `Vec` reservations driven by wire lengths.
/// Decoders grow past it on demand, so corrupt headers cannot force huge
/// allocations up front.
pub const MAX_PREALLOC_BYTES: usize = 1024 * 1024;

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded representation of the document header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub version: u8,
    pub flags: u8,
    /// External vocabulary URI; empty when the document carries literal names only.
    pub vocabulary_uri: String,
    /// Algorithm URIs in document-local index order.
    pub algorithms: Vec<String>,
}

impl DocumentHeader {
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Serialize the header, including the variable-length URI tables.
    ///
    /// Fails when a URI or the algorithm table does not fit its length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, UsageError> {
        if self.algorithms.len() > MAX_ALGORITHMS {
            return Err(UsageError::TooManyAlgorithms(self.algorithms.len()));
        }
        let mut buf = Vec::with_capacity(FIXED_HEADER_SIZE + 64);
        buf.extend_from_slice(MAGIC);
        buf.push(self.version);
        buf.push(self.flags);
        put_str16(&mut buf, "vocabulary URI", &self.vocabulary_uri)?;
        buf.push(self.algorithms.len() as u8);
        for uri in &self.algorithms {
            put_str16(&mut buf, "algorithm URI", uri)?;
        }
        Ok(buf)
    }
}

fn put_str16(buf: &mut Vec<u8>, what: &'static str, s: &str) -> Result<(), UsageError> {
    let len = u16::try_from(s.len()).map_err(|_| UsageError::TooLong {
        what,
        len: s.len(),
        max: u16::MAX as usize,
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}
