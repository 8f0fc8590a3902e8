use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use x3db_codecs::{ArrayAlgorithm, FloatArrayCodec, IntegerArrayCodec, DEFAULT_TOLERANCE};
use x3db_core::{DocumentHandler, DocumentHeader, ParseError, Reader, UsageError, Vocabulary, Writer};

use crate::error::{ContainerError, DocumentParseError};
use crate::scene::{write_scene, SceneBuilder, SceneNode};
use crate::x3d_vocabulary::{self, LEGACY_VOCABULARY_URI, VOCABULARY_URI};

/// Default input buffer: 32 MiB, so large scenes are read in few syscalls.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Input buffer used while parsing.
    pub buffer_size: usize,
    /// Absolute error allowed when encoding float arrays.
    pub float_tolerance: f32,
    /// Append the xxh3 trailer when encoding.
    pub checksum: bool,
    /// Declare the legacy vocabulary URI when encoding.
    pub legacy_uri: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            float_tolerance: DEFAULT_TOLERANCE,
            checksum: true,
            legacy_uri: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Unconfigured,
    Initialized,
    Parsing,
    Done,
    Failed,
}

/// Scene-level entry point for X3DB documents.
///
/// A codec starts `Unconfigured`. [`initialize`](Self::initialize) attaches
/// the shared X3D vocabulary (under both of its URIs) and both array
/// algorithms to a [`Reader`]. Each parse then moves it through `Parsing` to
/// `Done` or `Failed`; either way it can parse the next document. Parsing
/// takes `&mut self`, so one instance serves one thread at a time.
#[derive(Debug)]
pub struct ContainerCodec {
    config: ContainerConfig,
    state: ContainerState,
    bound: Option<Bound>,
}

/// Everything `initialize` attaches.
struct Bound {
    reader: Reader<ArrayAlgorithm>,
    vocabulary: Arc<Vocabulary>,
    float_codec: FloatArrayCodec,
}

impl std::fmt::Debug for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound")
            .field("buffer_size", &self.reader.buffer_size())
            .field("tolerance", &self.float_codec.tolerance())
            .finish_non_exhaustive()
    }
}

impl ContainerCodec {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            state: ContainerState::Unconfigured,
            bound: None,
        }
    }

    /// `new` followed by `initialize`.
    pub fn initialized(config: ContainerConfig) -> Result<Self, ContainerError> {
        let mut codec = Self::new(config);
        codec.initialize()?;
        Ok(codec)
    }

    /// Attach vocabulary and algorithms. A no-op once initialized.
    pub fn initialize(&mut self) -> Result<(), ContainerError> {
        if self.bound.is_some() {
            return Ok(());
        }
        let float_codec = FloatArrayCodec::with_tolerance(self.config.float_tolerance)?;
        let vocabulary = x3d_vocabulary::shared()?;

        let mut reader = Reader::new().with_buffer_size(self.config.buffer_size);
        for algorithm in ArrayAlgorithm::defaults() {
            reader.register_algorithm(algorithm);
        }
        reader
            .register_vocabulary(VOCABULARY_URI, Arc::clone(&vocabulary))
            .register_vocabulary(LEGACY_VOCABULARY_URI, Arc::clone(&vocabulary));

        debug!(
            buffer_size = self.config.buffer_size,
            tolerance = self.config.float_tolerance,
            "container codec initialized"
        );
        self.bound = Some(Bound {
            reader,
            vocabulary,
            float_codec,
        });
        self.state = ContainerState::Initialized;
        Ok(())
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The attached vocabulary, once initialized.
    pub fn vocabulary(&self) -> Option<&Arc<Vocabulary>> {
        self.bound.as_ref().map(|b| &b.vocabulary)
    }

    /// Stream one whole document from `input` into `handler`.
    ///
    /// `url` only labels errors. Every failure, including one raised by the
    /// handler, comes back as [`ContainerError::Parse`].
    pub fn parse_scene<R: Read, H: DocumentHandler>(
        &mut self,
        input: R,
        url: Option<&str>,
        handler: &mut H,
    ) -> Result<DocumentHeader, ContainerError> {
        let bound = self.bound.as_ref().ok_or(UsageError::NotInitialized)?;
        self.state = ContainerState::Parsing;
        match bound.reader.parse(input, handler) {
            Ok(header) => {
                self.state = ContainerState::Done;
                Ok(header)
            }
            Err(source) => {
                self.state = ContainerState::Failed;
                warn!(url = url.unwrap_or("<stream>"), error = %source, "X3D binary document rejected");
                Err(DocumentParseError {
                    url: url.map(str::to_owned),
                    source,
                }
                .into())
            }
        }
    }

    /// Parse a whole document into a scene tree.
    pub fn decode_scene<R: Read>(&mut self, input: R, url: Option<&str>) -> Result<SceneNode, ContainerError> {
        let mut builder = SceneBuilder::new();
        self.parse_scene(input, url, &mut builder)?;
        builder.into_scene().ok_or_else(|| {
            DocumentParseError {
                url: url.map(str::to_owned),
                source: ParseError::Rejected("document has no root element".into()),
            }
            .into()
        })
    }

    /// Write `scene` as one document to `out` and hand `out` back.
    pub fn encode_scene<W: Write>(&self, scene: &SceneNode, out: W) -> Result<W, ContainerError> {
        let bound = self.bound.as_ref().ok_or(UsageError::NotInitialized)?;
        let uri = if self.config.legacy_uri {
            LEGACY_VOCABULARY_URI
        } else {
            VOCABULARY_URI
        };
        let algorithms = vec![
            ArrayAlgorithm::from(IntegerArrayCodec::new()),
            ArrayAlgorithm::from(bound.float_codec),
        ];
        let mut writer = Writer::new(
            out,
            Some((uri, Arc::clone(&bound.vocabulary))),
            algorithms,
            self.config.checksum,
        )?;
        write_scene(&mut writer, scene)?;
        Ok(writer.finish()?)
    }
}
