/// Integration tests: full documents written by `Writer` and streamed back
/// through `Reader`, using the real array algorithms.
use std::sync::Arc;

use x3db_codecs::{ArrayAlgorithm, FloatArrayCodec, IntegerArrayCodec};
use x3db_core::format::{FLAG_HAS_CHECKSUM, MAGIC, TRAILER_SIZE};
use x3db_core::{
    Attribute, AttributeValue, DocumentHandler, Name, ParseError, Reader, TableKind, TypedArray,
    UsageError, Vocabulary, WriteError, Writer,
};

const VOCAB_URI: &str = "urn:test:vocabulary";

// ── helpers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start(String, Option<usize>, Vec<(String, AttributeValue)>),
    Text(String),
    End(String),
    EndDocument,
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl DocumentHandler for Recorder {
    fn start_element(&mut self, name: Name<'_>, attributes: &[Attribute<'_>]) -> Result<(), ParseError> {
        let attrs = attributes
            .iter()
            .map(|a| (a.name.local.to_owned(), a.value.clone()))
            .collect();
        self.events.push(Event::Start(name.local.to_owned(), name.index, attrs));
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        self.events.push(Event::Text(text.to_owned()));
        Ok(())
    }

    fn end_element(&mut self, name: Name<'_>) -> Result<(), ParseError> {
        self.events.push(Event::End(name.local.to_owned()));
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), ParseError> {
        self.events.push(Event::EndDocument);
        Ok(())
    }
}

fn vocabulary() -> Arc<Vocabulary> {
    let mut v = Vocabulary::new();
    for name in ["Scene", "Shape", "IndexedFaceSet", "Coordinate"] {
        v.add_element(name).unwrap();
    }
    for name in ["DEF", "coordIndex", "point", "solid"] {
        v.add_attribute(name).unwrap();
    }
    v.add_value("true").unwrap();
    v.add_value("false").unwrap();
    Arc::new(v)
}

fn reader() -> Reader<ArrayAlgorithm> {
    let mut reader = Reader::new();
    reader
        .register_algorithm(IntegerArrayCodec::new().into())
        .register_algorithm(FloatArrayCodec::new().into())
        .register_vocabulary(VOCAB_URI, vocabulary());
    reader
}

fn writer(checksum: bool) -> Writer<Vec<u8>, ArrayAlgorithm> {
    Writer::new(
        Vec::new(),
        Some((VOCAB_URI, vocabulary())),
        ArrayAlgorithm::defaults().to_vec(),
        checksum,
    )
    .unwrap()
}

/// Scene > Shape(DEF) > IndexedFaceSet(coordIndex, solid, creaseAngle) > Coordinate(point)
fn sample_document(checksum: bool) -> Vec<u8> {
    let mut w = writer(checksum);
    w.start_element("Scene", &[]).unwrap();
    w.start_element("Shape", &[("DEF", &"Box01".into())]).unwrap();
    let indices = AttributeValue::from(TypedArray::Int32(vec![0, 1, 2, -1, 2, 3, 0, -1]));
    w.start_element(
        "IndexedFaceSet",
        &[
            ("coordIndex", &indices),
            ("solid", &false.into()),
            ("creaseAngle", &"0.5".into()),
        ],
    )
    .unwrap();
    let points = AttributeValue::from(TypedArray::Float32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]));
    w.start_element("Coordinate", &[("point", &points)]).unwrap();
    w.end_element().unwrap();
    w.end_element().unwrap();
    w.end_element().unwrap();
    w.start_element("WorldInfo", &[]).unwrap();
    w.characters("hello").unwrap();
    w.end_element().unwrap();
    w.end_element().unwrap();
    w.finish().unwrap()
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_events() {
    let bytes = sample_document(true);
    assert_eq!(&bytes[..MAGIC.len()], MAGIC);

    let mut rec = Recorder::default();
    let header = reader().parse(bytes.as_slice(), &mut rec).unwrap();
    assert_eq!(header.vocabulary_uri, VOCAB_URI);
    assert_eq!(header.algorithms.len(), 2);
    assert!(header.has_flag(FLAG_HAS_CHECKSUM));

    let expected = vec![
        Event::Start("Scene".into(), Some(0), vec![]),
        Event::Start("Shape".into(), Some(1), vec![("DEF".into(), "Box01".into())]),
        Event::Start(
            "IndexedFaceSet".into(),
            Some(2),
            vec![
                ("coordIndex".into(), TypedArray::Int32(vec![0, 1, 2, -1, 2, 3, 0, -1]).into()),
                ("solid".into(), AttributeValue::Boolean(false)),
                ("creaseAngle".into(), "0.5".into()),
            ],
        ),
        Event::Start(
            "Coordinate".into(),
            Some(3),
            vec![(
                "point".into(),
                TypedArray::Float32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]).into(),
            )],
        ),
        Event::End("Coordinate".into()),
        Event::End("IndexedFaceSet".into()),
        Event::End("Shape".into()),
        Event::Start("WorldInfo".into(), None, vec![]),
        Event::Text("hello".into()),
        Event::End("WorldInfo".into()),
        Event::End("Scene".into()),
        Event::EndDocument,
    ];
    assert_eq!(rec.events, expected);
}

#[test]
fn test_without_checksum() {
    let with = sample_document(true);
    let without = sample_document(false);
    assert_eq!(with.len(), without.len() + TRAILER_SIZE);

    let mut a = Recorder::default();
    let mut b = Recorder::default();
    reader().parse(with.as_slice(), &mut a).unwrap();
    reader().parse(without.as_slice(), &mut b).unwrap();
    assert_eq!(a.events, b.events);
}

#[test]
fn test_literal_only_document() {
    let mut w: Writer<Vec<u8>, ArrayAlgorithm> =
        Writer::new(Vec::new(), None, vec![IntegerArrayCodec::new().into()], true).unwrap();
    w.start_element("Scene", &[("flag", &true.into()), ("hidden", &false.into()), ("note", &"true".into())])
        .unwrap();
    w.end_element().unwrap();
    let bytes = w.finish().unwrap();

    // no vocabulary needed to read it back
    let mut reader: Reader<ArrayAlgorithm> = Reader::new();
    reader.register_algorithm(IntegerArrayCodec::new().into());
    let mut rec = Recorder::default();
    let header = reader.parse(bytes.as_slice(), &mut rec).unwrap();
    assert!(header.vocabulary_uri.is_empty());
    assert_eq!(
        rec.events[0],
        Event::Start(
            "Scene".into(),
            None,
            vec![
                ("flag".into(), true.into()),
                ("hidden".into(), false.into()),
                ("note".into(), "true".into()),
            ]
        )
    );
}

#[test]
fn test_literal_boolean_byte_is_validated() {
    let mut w: Writer<Vec<u8>, ArrayAlgorithm> = Writer::new(Vec::new(), None, Vec::new(), false).unwrap();
    w.start_element("Scene", &[("flag", &true.into())]).unwrap();
    w.end_element().unwrap();
    let mut bytes = w.finish().unwrap();
    let pos = bytes.windows(6).position(|w| w == b"flag\x03\x01").unwrap();
    bytes[pos + 5] = 2;

    let err = Reader::<ArrayAlgorithm>::new()
        .parse(bytes.as_slice(), &mut Recorder::default())
        .unwrap_err();
    assert!(
        matches!(err, ParseError::UnknownTag { what: "boolean value", tag: 2, .. }),
        "{err:?}"
    );
}

#[test]
fn test_checksum_detects_corruption() {
    let mut bytes = sample_document(true);
    // flip a byte inside the WorldInfo character data
    let pos = bytes.windows(5).position(|w| w == b"hello").unwrap();
    bytes[pos] = b'j';
    let err = reader().parse(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
    assert!(matches!(err, ParseError::ChecksumMismatch { .. }), "{err:?}");
}

#[test]
fn test_trailing_data_rejected() {
    let mut bytes = sample_document(true);
    bytes.push(0);
    let mut rec = Recorder::default();
    let err = reader().parse(bytes.as_slice(), &mut rec).unwrap_err();
    assert!(matches!(err, ParseError::TrailingData));
    assert!(!rec.events.contains(&Event::EndDocument));
}

#[test]
fn test_truncated_document() {
    let bytes = sample_document(false);
    for cut in [0, 3, 9, bytes.len() / 2, bytes.len() - 1] {
        let err = reader().parse(&bytes[..cut], &mut Recorder::default()).unwrap_err();
        assert!(
            matches!(err, ParseError::Io(_) | ParseError::Encoding(_)),
            "cut {cut}: {err:?}"
        );
    }
}

#[test]
fn test_bad_magic_and_version() {
    let mut bytes = sample_document(false);
    bytes[0] = b'Y';
    assert!(matches!(
        reader().parse(bytes.as_slice(), &mut Recorder::default()),
        Err(ParseError::BadMagic)
    ));

    let mut bytes = sample_document(false);
    bytes[MAGIC.len()] = 9;
    assert!(matches!(
        reader().parse(bytes.as_slice(), &mut Recorder::default()),
        Err(ParseError::UnsupportedVersion(9))
    ));
}

#[test]
fn test_unregistered_vocabulary_and_algorithm() {
    let bytes = sample_document(true);

    let mut no_vocab: Reader<ArrayAlgorithm> = Reader::new();
    no_vocab.register_algorithm(IntegerArrayCodec::new().into());
    no_vocab.register_algorithm(FloatArrayCodec::new().into());
    match no_vocab.parse(bytes.as_slice(), &mut Recorder::default()) {
        Err(ParseError::UnknownVocabulary(uri)) => assert_eq!(uri, VOCAB_URI),
        other => panic!("expected UnknownVocabulary, got {other:?}"),
    }

    let mut no_float: Reader<ArrayAlgorithm> = Reader::new();
    no_float
        .register_algorithm(IntegerArrayCodec::new().into())
        .register_vocabulary(VOCAB_URI, vocabulary());
    assert!(matches!(
        no_float.parse(bytes.as_slice(), &mut Recorder::default()),
        Err(ParseError::UnknownAlgorithm(_))
    ));
}

#[test]
fn test_index_out_of_range() {
    // decode with a smaller vocabulary than the writer used
    let bytes = sample_document(false);
    let mut small = Vocabulary::new();
    small.add_element("Scene").unwrap();
    let mut reader: Reader<ArrayAlgorithm> = Reader::new();
    reader.register_vocabulary(VOCAB_URI, Arc::new(small));
    for codec in ArrayAlgorithm::defaults() {
        reader.register_algorithm(codec);
    }
    let err = reader.parse(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::IndexOutOfRange { table: TableKind::Element, index: 1, .. }
    ));
}

#[test]
fn test_writer_usage_errors() {
    let mut w = writer(true);
    assert!(matches!(w.end_element(), Err(WriteError::Usage(UsageError::UnbalancedEnd))));

    w.start_element("Scene", &[]).unwrap();
    assert_eq!(w.depth(), 1);
    assert!(matches!(w.finish(), Err(WriteError::Usage(UsageError::UnclosedElements(1)))));

    let mut ints_only: Writer<Vec<u8>, ArrayAlgorithm> =
        Writer::new(Vec::new(), None, vec![IntegerArrayCodec::new().into()], false).unwrap();
    let floats = AttributeValue::from(TypedArray::Float32(vec![1.0]));
    let err = ints_only.start_element("Coordinate", &[("point", &floats)]).unwrap_err();
    assert!(matches!(err, WriteError::Usage(UsageError::NoAlgorithm(_))));
}

#[test]
fn test_handler_error_aborts_parse() {
    struct RejectShapes;

    impl DocumentHandler for RejectShapes {
        fn start_element(&mut self, name: Name<'_>, _: &[Attribute<'_>]) -> Result<(), ParseError> {
            if name.local == "Shape" {
                return Err(ParseError::Rejected("no shapes".into()));
            }
            Ok(())
        }

        fn end_element(&mut self, _: Name<'_>) -> Result<(), ParseError> {
            Ok(())
        }
    }

    let bytes = sample_document(true);
    match reader().parse(bytes.as_slice(), &mut RejectShapes) {
        Err(ParseError::Rejected(msg)) => assert_eq!(msg, "no shapes"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[test]
fn test_small_buffer_reads_same_events() {
    let bytes = sample_document(true);
    let mut a = Recorder::default();
    let mut b = Recorder::default();
    reader().parse(bytes.as_slice(), &mut a).unwrap();
    reader().with_buffer_size(1).parse(bytes.as_slice(), &mut b).unwrap();
    assert_eq!(a.events, b.events);
}
