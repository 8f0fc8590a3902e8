use std::io::Write;
use std::sync::Arc;

use tracing::{debug, trace};
use xxhash_rust::xxh3::Xxh3;

use crate::codec::ArrayCodec;
use crate::error::{UsageError, WriteError};
use crate::event::AttributeValue;
use crate::format::{
    DocumentHeader, FLAG_HAS_CHECKSUM, NAME_INDEXED, NAME_LITERAL,
    OP_CHARACTERS, OP_END_DOCUMENT, OP_END_ELEMENT, OP_START_ELEMENT_INDEXED,
    OP_START_ELEMENT_LITERAL, VALUE_BOOLEAN, VALUE_ENCODED, VALUE_TABLE, VALUE_TEXT, VERSION,
};
use crate::vocabulary::Vocabulary;

/// Streaming serializer for X3DB documents.
///
/// # Write contract
/// The header (vocabulary URI and algorithm table) is written by [`Writer::new`].
/// Then call [`start_element`], [`characters`] and [`end_element`] in document
/// order, and finally [`finish`] to write `END_DOCUMENT` and the checksum
/// trailer. Nothing is buffered beyond one element's attribute list.
///
/// Names found in the vocabulary are written as indices, everything else
/// literally. Each typed array is encoded by the first algorithm whose kind
/// matches.
///
/// [`start_element`]: Writer::start_element
/// [`characters`]: Writer::characters
/// [`end_element`]: Writer::end_element
/// [`finish`]: Writer::finish
pub struct Writer<W: Write, A> {
    out: HashingWriter<W>,
    vocabulary: Option<Arc<Vocabulary>>,
    algorithms: Vec<A>,
    checksum: bool,
    depth: usize,
    elements: u64,
    arrays: u64,
}

impl<W: Write, A: ArrayCodec> Writer<W, A> {
    /// Write the document header to `out`.
    ///
    /// `vocabulary` pairs the URI declared in the header with the table used
    /// to index names; `None` writes every name literally.
    pub fn new(
        out: W,
        vocabulary: Option<(&str, Arc<Vocabulary>)>,
        algorithms: Vec<A>,
        checksum: bool,
    ) -> Result<Self, WriteError> {
        let (vocabulary_uri, vocabulary) = match vocabulary {
            Some((uri, v)) => (uri.to_owned(), Some(v)),
            None => (String::new(), None),
        };

        let header = DocumentHeader {
            version: VERSION,
            flags: if checksum { FLAG_HAS_CHECKSUM } else { 0 },
            vocabulary_uri,
            algorithms: algorithms.iter().map(|c| c.uri().to_owned()).collect(),
        };
        let header_bytes = header.to_bytes()?;
        let mut out = HashingWriter::new(out);
        out.write_all(&header_bytes)?;
        debug!(
            vocabulary = %header.vocabulary_uri,
            algorithms = header.algorithms.len(),
            checksum,
            "writing X3DB document"
        );

        Ok(Self {
            out,
            vocabulary,
            algorithms,
            checksum,
            depth: 0,
            elements: 0,
            arrays: 0,
        })
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open an element with its attributes.
    pub fn start_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &AttributeValue)],
    ) -> Result<(), WriteError> {
        check_len("attribute list", attributes.len(), u16::MAX as usize)?;

        let mut buf = Vec::with_capacity(8 + attributes.len() * 8);
        match self.vocabulary.as_ref().and_then(|v| v.elements().index_of(name)) {
            Some(index) => {
                buf.push(OP_START_ELEMENT_INDEXED);
                buf.extend_from_slice(&(index as u16).to_be_bytes());
            }
            None => {
                buf.push(OP_START_ELEMENT_LITERAL);
                put_str16(&mut buf, "element name", name)?;
            }
        }
        buf.extend_from_slice(&(attributes.len() as u16).to_be_bytes());

        for &(attr, value) in attributes {
            match self.vocabulary.as_ref().and_then(|v| v.attributes().index_of(attr)) {
                Some(index) => {
                    buf.push(NAME_INDEXED);
                    buf.extend_from_slice(&(index as u16).to_be_bytes());
                }
                None => {
                    buf.push(NAME_LITERAL);
                    put_str16(&mut buf, "attribute name", attr)?;
                }
            }
            self.put_value(&mut buf, value)?;
        }

        trace!(element = name, attributes = attributes.len(), "start element");
        self.out.write_all(&buf)?;
        self.depth += 1;
        self.elements += 1;
        Ok(())
    }

    /// Close the innermost open element.
    pub fn end_element(&mut self) -> Result<(), WriteError> {
        if self.depth == 0 {
            return Err(UsageError::UnbalancedEnd.into());
        }
        self.out.write_all(&[OP_END_ELEMENT])?;
        self.depth -= 1;
        Ok(())
    }

    /// Character content inside the current element.
    pub fn characters(&mut self, text: &str) -> Result<(), WriteError> {
        check_len("character data", text.len(), u32::MAX as usize)?;
        self.out.write_all(&[OP_CHARACTERS])?;
        self.out.write_all(&(text.len() as u32).to_be_bytes())?;
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Write `END_DOCUMENT` and the trailer, flush, and hand back the output.
    pub fn finish(mut self) -> Result<W, WriteError> {
        if self.depth != 0 {
            return Err(UsageError::UnclosedElements(self.depth).into());
        }
        self.out.write_all(&[OP_END_DOCUMENT])?;
        let digest = self.out.hasher.digest();
        let mut out = self.out.inner;
        if self.checksum {
            out.write_all(&digest.to_be_bytes())?;
        }
        out.flush()?;
        debug!(
            elements = self.elements,
            arrays = self.arrays,
            bytes = self.out.written + if self.checksum { 8 } else { 0 },
            "X3DB document written"
        );
        Ok(out)
    }

    fn put_value(&mut self, buf: &mut Vec<u8>, value: &AttributeValue) -> Result<(), WriteError> {
        match value {
            AttributeValue::Text(text) => {
                buf.push(VALUE_TEXT);
                put_str32(buf, "attribute value", text)?;
            }
            AttributeValue::Boolean(b) => {
                let literal = if *b { "true" } else { "false" };
                match self.vocabulary.as_ref().and_then(|v| v.values().index_of(literal)) {
                    Some(index) => {
                        buf.push(VALUE_TABLE);
                        buf.extend_from_slice(&(index as u16).to_be_bytes());
                    }
                    None => buf.extend_from_slice(&[VALUE_BOOLEAN, u8::from(*b)]),
                }
            }
            AttributeValue::Array(array) => {
                let (index, codec) = self
                    .algorithms
                    .iter()
                    .enumerate()
                    .find(|(_, c)| c.kind() == array.kind())
                    .ok_or(UsageError::NoAlgorithm(array.kind()))?;
                let block = codec.encode(array)?;
                check_len("array block", block.len(), u32::MAX as usize)?;
                trace!(algorithm = codec.name(), elements = array.len(), bytes = block.len(), "encoded array block");
                buf.push(VALUE_ENCODED);
                buf.push(index as u8);
                buf.extend_from_slice(&(block.len() as u32).to_be_bytes());
                buf.extend_from_slice(&block);
                self.arrays += 1;
            }
        }
        Ok(())
    }
}

fn check_len(what: &'static str, len: usize, max: usize) -> Result<(), UsageError> {
    if len > max {
        return Err(UsageError::TooLong { what, len, max });
    }
    Ok(())
}

fn put_str16(buf: &mut Vec<u8>, what: &'static str, s: &str) -> Result<(), UsageError> {
    check_len(what, s.len(), u16::MAX as usize)?;
    buf.extend_from_slice(&(s.len() as u16).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn put_str32(buf: &mut Vec<u8>, what: &'static str, s: &str) -> Result<(), UsageError> {
    check_len(what, s.len(), u32::MAX as usize)?;
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Output wrapper that hashes and counts every byte written through it.
struct HashingWriter<W> {
    inner: W,
    hasher: Xxh3,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Xxh3::new(),
            written: 0,
        }
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
