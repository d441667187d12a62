//! ovc-export library
//!
//! Adapts meshes and animation channels to the `ovc-codec` block codec:
//! writes compressed payloads into a shared output stream and records the
//! `open-vector-compression` metadata needed to find and decode them.

pub mod animation;
pub mod context;
pub mod dump;
pub mod error;
pub mod formats;
pub mod geometry;
pub mod mesh;
pub mod profile;
pub mod settings;
pub mod stream;
pub mod verify;

// Re-export key types for the adapters
pub use animation::{
    channel_quant_bits, encode_channel, write_animation_parameter, Animation, AnimationParameter,
    PayloadRange, Sampler,
};
pub use context::ConverterContext;
pub use error::CompressionError;
pub use formats::{CompressedData, EXTENSION_NAME};
pub use geometry::{compress_mesh_if_eligible, encode_geometry};
pub use mesh::{can_compress, Mesh, MeshAttribute, Primitive, PrimitiveKind, Semantic};
pub use settings::{BoundsMode, CompressionSettings, CompressionType, EncodingMode};
pub use stream::OutputStream;
pub use verify::{verify_geometry, DecodedGeometry, VerificationReport, VerifyOutcome};
