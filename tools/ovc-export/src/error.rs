//! Error type for the compression adapters

use ovc_codec::CodecError;

/// Errors surfaced by geometry and channel compression
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Mesh '{mesh}' is not eligible for compression: primitive {primitive} is {kind}")]
    Ineligible {
        mesh: String,
        primitive: usize,
        kind: &'static str,
    },

    #[error("Out of memory allocating {len} elements for {what}")]
    OutOfMemory { what: &'static str, len: usize },

    #[error("Channel has zero components per element")]
    ZeroComponents,

    #[error("Channel buffer holds {actual} floats, expected at least {expected}")]
    ChannelBufferTooSmall { expected: usize, actual: usize },

    #[error("Attribute '{attribute}' has {actual} elements, expected {expected}")]
    VertexCountMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },

    #[error("Byte offset {0} does not fit in 32 bits")]
    OffsetOverflow(u64),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to write output stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Allocate an empty scratch buffer with room for `len` elements
///
/// Allocation failure is reported instead of aborting the process.
pub(crate) fn scratch<T>(what: &'static str, len: usize) -> Result<Vec<T>, CompressionError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| CompressionError::OutOfMemory { what, len })?;
    Ok(buf)
}

/// Narrow a stream offset or length to the 32-bit metadata field
pub(crate) fn to_u32(value: u64) -> Result<u32, CompressionError> {
    u32::try_from(value).map_err(|_| CompressionError::OffsetOverflow(value))
}
