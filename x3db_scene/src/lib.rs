//! X3D scenes over the X3DB binary document format.
//!
//! Binds the fixed X3D vocabulary and the two array algorithms to the
//! document engine and exposes whole-scene encode and decode through
//! [`ContainerCodec`].

pub mod container;
pub mod error;
pub mod scene;
pub mod x3d_vocabulary;

pub use container::{ContainerCodec, ContainerConfig, ContainerState, DEFAULT_BUFFER_SIZE};
pub use error::{ContainerError, DocumentParseError};
pub use scene::{write_scene, SceneAttribute, SceneBuilder, SceneNode};
pub use x3d_vocabulary::{LEGACY_VOCABULARY_URI, VOCABULARY_URI};
