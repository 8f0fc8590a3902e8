use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::sync::Arc;

use tracing::{debug, trace};
use xxhash_rust::xxh3::Xxh3;

use crate::codec::ArrayCodec;
use crate::error::ParseError;
use crate::event::{Attribute, AttributeValue, DocumentHandler, Name};
use crate::format::{
    DocumentHeader, FLAG_HAS_CHECKSUM, MAGIC, MAX_BLOCK_BYTES, MAX_PREALLOC_BYTES,
    MAX_STRING_BYTES, NAME_INDEXED, NAME_LITERAL, OP_CHARACTERS, OP_END_DOCUMENT,
    OP_END_ELEMENT, OP_START_ELEMENT_INDEXED, OP_START_ELEMENT_LITERAL, TRAILER_SIZE,
    VALUE_BOOLEAN, VALUE_ENCODED, VALUE_TABLE, VALUE_TEXT, VERSION,
};
use crate::vocabulary::{TableKind, Vocabulary};

/// Default input buffer: 64 KB. Scene-level callers usually ask for far more.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming parser for X3DB documents.
///
/// # Configuration
/// Before parsing, register every array algorithm (keyed by its URI) and every
/// external vocabulary (keyed by the URI documents use to declare it). One
/// vocabulary may be registered under several URIs.
///
/// # Parse sequence
/// 1. Read the fixed header (magic, version, flags), the vocabulary URI and the
///    algorithm URI table; resolve each URI against the registrations.
/// 2. Stream body opcodes, dispatching events to the [`DocumentHandler`] in
///    document order. Array blocks are decoded in full before dispatch.
/// 3. After `END_DOCUMENT`, verify the checksum trailer (if flagged) and
///    require end of input. Only then is `end_document` delivered.
pub struct Reader<A> {
    algorithms: HashMap<String, A>,
    vocabularies: HashMap<String, Arc<Vocabulary>>,
    buffer_size: usize,
}

impl<A: ArrayCodec> Default for Reader<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ArrayCodec> Reader<A> {
    pub fn new() -> Self {
        Self {
            algorithms: HashMap::new(),
            vocabularies: HashMap::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Register `codec` under its own URI, replacing any previous registration.
    pub fn register_algorithm(&mut self, codec: A) -> &mut Self {
        self.algorithms.insert(codec.uri().to_owned(), codec);
        self
    }

    /// Register `vocabulary` under `uri`.
    pub fn register_vocabulary(
        &mut self,
        uri: impl Into<String>,
        vocabulary: Arc<Vocabulary>,
    ) -> &mut Self {
        self.vocabularies.insert(uri.into(), vocabulary);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn algorithm(&self, uri: &str) -> Option<&A> {
        self.algorithms.get(uri)
    }

    pub fn vocabulary(&self, uri: &str) -> Option<&Arc<Vocabulary>> {
        self.vocabularies.get(uri)
    }

    /// Parse one complete document from `input`, draining it to the end.
    ///
    /// Returns the document header on success.
    pub fn parse<R: Read, H: DocumentHandler>(
        &self,
        input: R,
        handler: &mut H,
    ) -> Result<DocumentHeader, ParseError> {
        let mut src = HashingReader::new(BufReader::with_capacity(self.buffer_size, input));

        // ── Header ──────────────────────────────────────────────────────────
        let mut magic = [0u8; MAGIC.len()];
        src.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ParseError::BadMagic);
        }
        let version = src.read_u8()?;
        if version != VERSION {
            return Err(ParseError::UnsupportedVersion(version));
        }
        let flags = src.read_u8()?;
        let vocabulary_uri = src.read_str16("vocabulary URI")?;
        let algorithm_count = src.read_u8()? as usize;
        let mut algorithm_uris = Vec::with_capacity(algorithm_count);
        for _ in 0..algorithm_count {
            algorithm_uris.push(src.read_str16("algorithm URI")?);
        }

        let vocabulary = if vocabulary_uri.is_empty() {
            None
        } else {
            let v = self
                .vocabularies
                .get(&vocabulary_uri)
                .ok_or_else(|| ParseError::UnknownVocabulary(vocabulary_uri.clone()))?;
            Some(Arc::clone(v))
        };
        let algorithms = algorithm_uris
            .iter()
            .map(|uri| {
                self.algorithms
                    .get(uri)
                    .ok_or_else(|| ParseError::UnknownAlgorithm(uri.clone()))
            })
            .collect::<Result<Vec<&A>, _>>()?;

        let header = DocumentHeader {
            version,
            flags,
            vocabulary_uri,
            algorithms: algorithm_uris,
        };
        debug!(
            vocabulary = %header.vocabulary_uri,
            algorithms = header.algorithms.len(),
            checksum = header.has_flag(FLAG_HAS_CHECKSUM),
            "parsing X3DB document"
        );

        // ── Body ────────────────────────────────────────────────────────────
        let body = Body {
            vocabulary: vocabulary.as_deref(),
            algorithms: &algorithms,
        };
        handler.start_document()?;
        let elements = body.parse(&mut src, handler)?;

        // ── Trailer ─────────────────────────────────────────────────────────
        let computed = src.hasher.digest();
        let mut inner = src.inner;
        if header.has_flag(FLAG_HAS_CHECKSUM) {
            let mut trailer = [0u8; TRAILER_SIZE];
            inner.read_exact(&mut trailer)?;
            let expected = u64::from_be_bytes(trailer);
            if expected != computed {
                return Err(ParseError::ChecksumMismatch { expected, computed });
            }
        }
        let mut rest = Vec::new();
        inner.take(1).read_to_end(&mut rest)?;
        if !rest.is_empty() {
            return Err(ParseError::TrailingData);
        }

        handler.end_document()?;
        debug!(elements, bytes = src.offset, "X3DB document parsed");
        Ok(header)
    }
}

/// Per-document resolution state for the body.
struct Body<'d, A> {
    vocabulary: Option<&'d Vocabulary>,
    algorithms: &'d [&'d A],
}

/// Name read off the wire, before it is lent to the handler.
enum RawName<'v> {
    Indexed(usize, &'v str),
    Literal(String),
}

impl RawName<'_> {
    fn as_name(&self) -> Name<'_> {
        match self {
            Self::Indexed(index, local) => Name::indexed(*index, local),
            Self::Literal(local) => Name::literal(local),
        }
    }
}

impl<'d, A: ArrayCodec> Body<'d, A> {
    /// Returns the number of elements read.
    fn parse<R: Read, H: DocumentHandler>(
        &self,
        src: &mut HashingReader<R>,
        handler: &mut H,
    ) -> Result<u64, ParseError> {
        let mut open: Vec<RawName<'d>> = Vec::new();
        let mut elements = 0u64;

        loop {
            let offset = src.offset;
            match src.read_u8()? {
                OP_END_DOCUMENT => break,
                op @ (OP_START_ELEMENT_INDEXED | OP_START_ELEMENT_LITERAL) => {
                    let name = if op == OP_START_ELEMENT_INDEXED {
                        let index = src.read_u16()? as usize;
                        RawName::Indexed(index, self.resolve(TableKind::Element, index, offset)?)
                    } else {
                        RawName::Literal(src.read_str16("element name")?)
                    };
                    let (names, values) = self.read_attributes(src)?;
                    let attributes: Vec<Attribute<'_>> = names
                        .iter()
                        .zip(values)
                        .map(|(n, value)| Attribute {
                            name: n.as_name(),
                            value,
                        })
                        .collect();
                    trace!(element = name.as_name().local, attributes = attributes.len(), "start element");
                    handler.start_element(name.as_name(), &attributes)?;
                    open.push(name);
                    elements += 1;
                }
                OP_END_ELEMENT => {
                    let name = open
                        .pop()
                        .ok_or(ParseError::Unbalanced("end element without matching start"))?;
                    handler.end_element(name.as_name())?;
                }
                OP_CHARACTERS => {
                    let text = src.read_str32("character data")?;
                    handler.characters(&text)?;
                }
                tag => {
                    return Err(ParseError::UnknownTag {
                        what: "opcode",
                        tag,
                        offset,
                    })
                }
            }
        }

        if !open.is_empty() {
            return Err(ParseError::Unbalanced("document ended with open elements"));
        }
        Ok(elements)
    }

    fn resolve(&self, table: TableKind, index: usize, offset: u64) -> Result<&'d str, ParseError> {
        self.vocabulary
            .and_then(|v| v.table(table).name_of(index))
            .ok_or(ParseError::IndexOutOfRange {
                table,
                index,
                offset,
            })
    }

    fn read_attributes<R: Read>(
        &self,
        src: &mut HashingReader<R>,
    ) -> Result<(Vec<RawName<'d>>, Vec<AttributeValue>), ParseError> {
        let count = src.read_u16()? as usize;
        let mut names = Vec::with_capacity(count);
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = src.offset;
            let name = match src.read_u8()? {
                NAME_INDEXED => {
                    let index = src.read_u16()? as usize;
                    RawName::Indexed(index, self.resolve(TableKind::Attribute, index, offset)?)
                }
                NAME_LITERAL => RawName::Literal(src.read_str16("attribute name")?),
                tag => {
                    return Err(ParseError::UnknownTag {
                        what: "attribute name tag",
                        tag,
                        offset,
                    })
                }
            };
            names.push(name);
            values.push(self.read_value(src)?);
        }
        Ok((names, values))
    }

    fn read_value<R: Read>(&self, src: &mut HashingReader<R>) -> Result<AttributeValue, ParseError> {
        let offset = src.offset;
        match src.read_u8()? {
            VALUE_TEXT => Ok(AttributeValue::Text(src.read_str32("attribute value")?)),
            VALUE_TABLE => {
                let index = src.read_u16()? as usize;
                Ok(match self.resolve(TableKind::Value, index, offset)? {
                    "true" => AttributeValue::Boolean(true),
                    "false" => AttributeValue::Boolean(false),
                    other => AttributeValue::Text(other.to_owned()),
                })
            }
            VALUE_ENCODED => {
                let index = src.read_u8()? as usize;
                let codec = self.algorithms.get(index).ok_or(ParseError::AlgorithmOutOfRange {
                    index,
                    declared: self.algorithms.len(),
                })?;
                let len = src.read_u32()? as usize;
                let block = src.read_bytes(len, MAX_BLOCK_BYTES, "array block")?;
                let array = codec.decode(&block)?;
                trace!(algorithm = codec.name(), bytes = len, elements = array.len(), "decoded array block");
                Ok(AttributeValue::Array(array))
            }
            VALUE_BOOLEAN => match src.read_u8()? {
                0 => Ok(AttributeValue::Boolean(false)),
                1 => Ok(AttributeValue::Boolean(true)),
                tag => Err(ParseError::UnknownTag {
                    what: "boolean value",
                    tag,
                    offset: offset + 1,
                }),
            },
            tag => Err(ParseError::UnknownTag {
                what: "attribute value tag",
                tag,
                offset,
            }),
        }
    }
}

/// Input wrapper that hashes and counts every byte it hands out.
struct HashingReader<R> {
    inner: R,
    hasher: Xxh3,
    offset: u64,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Xxh3::new(),
            offset: 0,
        }
    }

    fn read_u8(&mut self) -> Result<u8, ParseError> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16, ParseError> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, ParseError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_bytes(&mut self, len: usize, max: usize, what: &'static str) -> Result<Vec<u8>, ParseError> {
        if len > max {
            return Err(ParseError::TooLarge { what, len, max });
        }
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC_BYTES));
        self.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{what}: expected {len} bytes, input ended after {}", buf.len()),
            )
            .into());
        }
        Ok(buf)
    }

    fn read_str16(&mut self, what: &'static str) -> Result<String, ParseError> {
        let len = self.read_u16()? as usize;
        self.read_string(len, what)
    }

    fn read_str32(&mut self, what: &'static str) -> Result<String, ParseError> {
        let len = self.read_u32()? as usize;
        self.read_string(len, what)
    }

    fn read_string(&mut self, len: usize, what: &'static str) -> Result<String, ParseError> {
        let bytes = self.read_bytes(len, MAX_STRING_BYTES, what)?;
        String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8(what))
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.offset += n as u64;
        Ok(n)
    }
}
