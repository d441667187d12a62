//! OVC: quantizing block codec for indexed triangle meshes and dynamic vectors
//!
//! **This is a pure codec** - it turns borrowed float/index buffers into an
//! opaque byte payload and back. Where that payload lives (offsets inside a
//! shared output stream, metadata describing how to find it) is handled by the
//! caller (`ovc-export`).
//!
//! # Payload Format
//!
//! ```text
//! 0x00: magic (4 bytes, "OVCM" for meshes, "OVCV" for dynamic vectors)
//! 0x04: stream type marker ('A' = ascii, 'B' = binary)
//! 0x05: token stream (header, then payload)
//! ```
//!
//! Binary streams write unsigned integers as LEB128 varints, signed integers
//! zig-zagged, and floats as little-endian IEEE-754. Ascii streams write every
//! token as decimal text followed by a single space.
//!
//! # Compression
//!
//! Every scalar is quantized to `quant_bits` against the slot's min/max, then
//! decorrelated with a prediction mode (differential, parallelogram, or
//! surface-normal aware) driven by mesh connectivity. Only the residuals are
//! stored.
//!
//! # Usage
//!
//! ```
//! use ovc_codec::{
//!     encode_mesh, AxisMode, EncodeParams, IndexedFaceSet, MeshDecoder, MeshTarget,
//!     PredictionMode, Slot, StreamType,
//! };
//!
//! let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//! let indices = [0u16, 1, 2];
//! let ids = [0u32];
//!
//! let mut ifs = IndexedFaceSet::new(&indices, &ids);
//! ifs.coord = Some(Slot::new(&positions, 3, 3, 12, PredictionMode::Parallelogram));
//! ifs.compute_min_max(AxisMode::SeparateDims);
//!
//! let payload = encode_mesh(&ifs, &EncodeParams::new(StreamType::Binary)).unwrap();
//!
//! let decoder = MeshDecoder::new(&payload).unwrap();
//! assert_eq!(decoder.header().triangle_count, 1);
//!
//! let mut out_indices = [0u16; 3];
//! let mut out_coords = [0.0f32; 9];
//! let mut target = MeshTarget::new(&mut out_indices);
//! target.coord = Some(&mut out_coords);
//! decoder.decode_payload(&mut target).unwrap();
//! assert_eq!(out_indices, indices);
//! ```

mod bitstream;
mod decode;
mod encode;
mod predict;
mod vector;

pub use bitstream::{StreamReader, StreamWriter};
pub use decode::{FloatSlotHeader, MeshDecoder, MeshHeader, MeshTarget, SlotHeader};
pub use encode::encode_mesh;
pub use vector::{
    encode_dynamic_vector, DynamicVector, DynamicVectorDecoder, DynamicVectorHeader,
    VectorEncodeParams,
};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes at the start of every mesh payload
pub const MESH_MAGIC: &[u8; 4] = b"OVCM";

/// Magic bytes at the start of every dynamic vector payload
pub const VECTOR_MAGIC: &[u8; 4] = b"OVCV";

/// Payload format version
pub const FORMAT_VERSION: u32 = 1;

/// Largest supported quantization bit depth
pub const MAX_QUANT_BITS: u32 = 24;

/// Maximum number of numbered float attribute slots per face set
pub const MAX_FLOAT_ATTRIBUTES: usize = 16;

// =============================================================================
// Enums
// =============================================================================

/// Token encoding used for the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    /// Whitespace separated decimal text
    Ascii,
    /// Varints and little-endian floats
    #[default]
    Binary,
}

impl StreamType {
    pub(crate) fn marker(self) -> u8 {
        match self {
            StreamType::Ascii => b'A',
            StreamType::Binary => b'B',
        }
    }

    pub(crate) fn from_marker(marker: u8) -> Result<Self, CodecError> {
        match marker {
            b'A' => Ok(StreamType::Ascii),
            b'B' => Ok(StreamType::Binary),
            other => Err(CodecError::InvalidStreamType(other)),
        }
    }
}

/// Scheme used to predict a quantized value before storing its residual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
    /// Store quantized values directly
    None,
    /// Predict from the previously coded vertex
    Differential,
    /// Predict `a + b - opposite` across a shared edge
    Parallelogram,
    /// Predict from the midpoint of the coded edge (unit vectors vary smoothly)
    SurfaceNormals,
}

impl PredictionMode {
    pub(crate) fn code(self) -> u32 {
        match self {
            PredictionMode::None => 0,
            PredictionMode::Differential => 1,
            PredictionMode::Parallelogram => 2,
            PredictionMode::SurfaceNormals => 3,
        }
    }

    pub(crate) fn from_code(code: u32) -> Result<Self, CodecError> {
        match code {
            0 => Ok(PredictionMode::None),
            1 => Ok(PredictionMode::Differential),
            2 => Ok(PredictionMode::Parallelogram),
            3 => Ok(PredictionMode::SurfaceNormals),
            other => Err(CodecError::InvalidPredictionMode(other)),
        }
    }
}

/// How min/max bounds are computed across the components of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    /// Every axis gets its own range
    #[default]
    SeparateDims,
    /// Every axis shares the largest range (anchored at its own minimum)
    AllDims,
}

/// Semantic hint stored with each float attribute slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatAttributeType {
    Unknown,
    TexCoord,
    Color,
    Weight,
}

impl FloatAttributeType {
    pub(crate) fn code(self) -> u32 {
        match self {
            FloatAttributeType::Unknown => 0,
            FloatAttributeType::TexCoord => 1,
            FloatAttributeType::Color => 2,
            FloatAttributeType::Weight => 3,
        }
    }

    pub(crate) fn from_code(code: u32) -> Result<Self, CodecError> {
        match code {
            0 => Ok(FloatAttributeType::Unknown),
            1 => Ok(FloatAttributeType::TexCoord),
            2 => Ok(FloatAttributeType::Color),
            3 => Ok(FloatAttributeType::Weight),
            other => Err(CodecError::InvalidAttributeType(other)),
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// One codec-facing attribute stream borrowed from the caller
///
/// `data` holds `count * dim` floats, tightly packed. `min`/`max` are filled
/// by [`IndexedFaceSet::compute_min_max`]; the encoder computes per-axis bounds
/// itself when they are left empty.
#[derive(Debug, Clone)]
pub struct Slot<'a> {
    pub data: &'a [f32],
    pub count: usize,
    pub dim: usize,
    pub quant_bits: u32,
    pub prediction: PredictionMode,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl<'a> Slot<'a> {
    pub fn new(
        data: &'a [f32],
        count: usize,
        dim: usize,
        quant_bits: u32,
        prediction: PredictionMode,
    ) -> Self {
        Self {
            data,
            count,
            dim,
            quant_bits,
            prediction,
            min: Vec::new(),
            max: Vec::new(),
        }
    }

    pub fn compute_min_max(&mut self, mode: AxisMode) {
        let (min, max) = compute_min_max(self.data, self.count, self.dim, self.dim, mode);
        self.min = min;
        self.max = max;
    }

    pub(crate) fn has_bounds(&self) -> bool {
        self.min.len() == self.dim && self.max.len() == self.dim
    }
}

/// A numbered float attribute slot plus its semantic hint
#[derive(Debug, Clone)]
pub struct FloatAttribute<'a> {
    pub kind: FloatAttributeType,
    pub slot: Slot<'a>,
}

/// Codec input: a triangle list with per-triangle primitive tags and
/// attribute slots, all borrowed for the duration of one encode call
#[derive(Debug, Clone)]
pub struct IndexedFaceSet<'a> {
    /// Concatenated triangle indices (3 per triangle)
    pub coord_index: &'a [u16],
    /// Primitive tag per triangle
    pub index_buffer_ids: &'a [u32],
    pub coord: Option<Slot<'a>>,
    pub normal: Option<Slot<'a>>,
    pub float_attributes: Vec<FloatAttribute<'a>>,
}

impl<'a> IndexedFaceSet<'a> {
    pub fn new(coord_index: &'a [u16], index_buffer_ids: &'a [u32]) -> Self {
        Self {
            coord_index,
            index_buffer_ids,
            coord: None,
            normal: None,
            float_attributes: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.coord_index.len() / 3
    }

    /// Compute bounds for every slot
    pub fn compute_min_max(&mut self, mode: AxisMode) {
        if let Some(coord) = self.coord.as_mut() {
            coord.compute_min_max(mode);
        }
        if let Some(normal) = self.normal.as_mut() {
            normal.compute_min_max(mode);
        }
        for attribute in &mut self.float_attributes {
            attribute.slot.compute_min_max(mode);
        }
    }
}

/// Encoder configuration shared by all slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    pub stream_type: StreamType,
}

impl EncodeParams {
    pub fn new(stream_type: StreamType) -> Self {
        Self { stream_type }
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur while encoding or decoding a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload does not start with the expected magic bytes
    InvalidMagic,
    /// Payload was written by an unknown format version
    UnsupportedVersion(u32),
    /// Stream type marker is neither 'A' nor 'B'
    InvalidStreamType(u8),
    /// Data was truncated before the end of the payload
    TruncatedData,
    /// An ascii token could not be parsed, or a varint overflowed
    MalformedToken,
    /// Quantization bit depth outside 1..=MAX_QUANT_BITS
    InvalidQuantBits(u32),
    /// Unknown prediction mode code
    InvalidPredictionMode(u32),
    /// Unknown float attribute type code
    InvalidAttributeType(u32),
    /// A slot buffer holds fewer floats than count * dim
    BufferTooSmall { expected: usize, actual: usize },
    /// Index count is not a multiple of three
    IndexCountNotTriangles(usize),
    /// Primitive tag count differs from triangle count
    MismatchedTriangleIds { triangles: usize, ids: usize },
    /// More float attributes than MAX_FLOAT_ATTRIBUTES
    TooManyFloatAttributes(usize),
    /// A slot or vector has zero components per element
    ZeroDimension,
    /// A decode target slice is shorter than the decoded data
    TargetTooSmall { expected: usize, actual: usize },
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::InvalidMagic => write!(f, "invalid payload magic"),
            CodecError::UnsupportedVersion(v) => write!(f, "unsupported payload version {}", v),
            CodecError::InvalidStreamType(m) => write!(f, "invalid stream type marker 0x{:02x}", m),
            CodecError::TruncatedData => write!(f, "truncated payload data"),
            CodecError::MalformedToken => write!(f, "malformed token in payload"),
            CodecError::InvalidQuantBits(b) => {
                write!(f, "invalid quantization bits {} (must be 1-{})", b, MAX_QUANT_BITS)
            }
            CodecError::InvalidPredictionMode(m) => write!(f, "invalid prediction mode {}", m),
            CodecError::InvalidAttributeType(t) => write!(f, "invalid float attribute type {}", t),
            CodecError::BufferTooSmall { expected, actual } => write!(
                f,
                "attribute buffer holds {} floats, expected at least {}",
                actual, expected
            ),
            CodecError::IndexCountNotTriangles(n) => {
                write!(f, "index count {} is not a multiple of 3", n)
            }
            CodecError::MismatchedTriangleIds { triangles, ids } => write!(
                f,
                "{} primitive tags for {} triangles",
                ids, triangles
            ),
            CodecError::TooManyFloatAttributes(n) => write!(
                f,
                "{} float attributes (maximum {})",
                n, MAX_FLOAT_ATTRIBUTES
            ),
            CodecError::ZeroDimension => write!(f, "attribute has zero components"),
            CodecError::TargetTooSmall { expected, actual } => write!(
                f,
                "decode target holds {} elements, expected {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for CodecError {}

// =============================================================================
// Helper Functions
// =============================================================================

/// Compute per-component bounds over `count` elements of `dim` components
///
/// Elements start every `stride` floats. With [`AxisMode::AllDims`] every
/// axis is widened to the largest per-axis range. Empty input yields zeros.
pub fn compute_min_max(
    data: &[f32],
    count: usize,
    dim: usize,
    stride: usize,
    mode: AxisMode,
) -> (Vec<f32>, Vec<f32>) {
    let mut min = vec![f32::MAX; dim];
    let mut max = vec![f32::MIN; dim];

    let mut seen = false;
    for element in 0..count {
        let base = element * stride;
        let Some(values) = data.get(base..base + dim) else {
            break;
        };
        seen = true;
        for (d, &v) in values.iter().enumerate() {
            min[d] = min[d].min(v);
            max[d] = max[d].max(v);
        }
    }

    if !seen {
        return (vec![0.0; dim], vec![0.0; dim]);
    }

    if mode == AxisMode::AllDims {
        let delta = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| hi - lo)
            .fold(0.0f32, f32::max);
        for d in 0..dim {
            max[d] = min[d] + delta;
        }
    }

    (min, max)
}

/// Largest quantized value for a bit depth
#[inline]
pub fn quant_max(bits: u32) -> i64 {
    (1i64 << bits) - 1
}

/// Quantize a value against `[min, max]` with `bits` of precision
#[inline]
pub fn quantize(value: f32, min: f32, max: f32, bits: u32) -> i64 {
    let range = max as f64 - min as f64;
    if range <= 0.0 || !range.is_finite() {
        return 0;
    }
    let qmax = quant_max(bits);
    let scaled = (value as f64 - min as f64) / range * qmax as f64;
    (scaled.round() as i64).clamp(0, qmax)
}

/// Inverse of [`quantize`]
#[inline]
pub fn dequantize(q: i64, min: f32, max: f32, bits: u32) -> f32 {
    let range = max as f64 - min as f64;
    if range <= 0.0 || !range.is_finite() {
        return min;
    }
    (min as f64 + q as f64 * range / quant_max(bits) as f64) as f32
}

pub(crate) fn check_quant_bits(bits: u32) -> Result<(), CodecError> {
    if bits == 0 || bits > MAX_QUANT_BITS {
        return Err(CodecError::InvalidQuantBits(bits));
    }
    Ok(())
}

#[inline]
pub(crate) fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
pub(crate) fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_endpoints() {
        assert_eq!(quantize(0.0, 0.0, 4095.0, 12), 0);
        assert_eq!(quantize(4095.0, 0.0, 4095.0, 12), 4095);
        assert_eq!(quantize(1000.4, 0.0, 4095.0, 12), 1000);
        assert_eq!(dequantize(1000, 0.0, 4095.0, 12), 1000.0);
    }

    #[test]
    fn test_quantize_degenerate_range() {
        assert_eq!(quantize(3.5, 3.5, 3.5, 10), 0);
        assert_eq!(dequantize(0, 3.5, 3.5, 10), 3.5);
    }

    #[test]
    fn test_quantize_clamps_out_of_range() {
        assert_eq!(quantize(-1.0, 0.0, 1.0, 8), 0);
        assert_eq!(quantize(2.0, 0.0, 1.0, 8), 255);
    }

    #[test]
    fn test_zigzag() {
        for v in [0i64, 1, -1, 2, -2, 4095, -4095, i32::MAX as i64, i32::MIN as i64] {
            assert_eq!(unzigzag(zigzag(v)), v);
        }
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
    }

    #[test]
    fn test_compute_min_max_separate() {
        let data = [0.0, 10.0, 5.0, 2.0, -1.0, 3.0];
        let (min, max) = compute_min_max(&data, 3, 2, 2, AxisMode::SeparateDims);
        assert_eq!(min, vec![-1.0, 2.0]);
        assert_eq!(max, vec![5.0, 10.0]);
    }

    #[test]
    fn test_compute_min_max_all_dims() {
        let data = [0.0, 10.0, 5.0, 2.0, -1.0, 3.0];
        let (min, max) = compute_min_max(&data, 3, 2, 2, AxisMode::AllDims);
        assert_eq!(min, vec![-1.0, 2.0]);
        // largest range is 8 (axis 1)
        assert_eq!(max, vec![7.0, 10.0]);
    }

    #[test]
    fn test_compute_min_max_strided() {
        let data = [1.0, 99.0, 2.0, 99.0, 3.0, 99.0];
        let (min, max) = compute_min_max(&data, 3, 1, 2, AxisMode::SeparateDims);
        assert_eq!(min, vec![1.0]);
        assert_eq!(max, vec![3.0]);
    }

    #[test]
    fn test_compute_min_max_empty() {
        let (min, max) = compute_min_max(&[], 0, 3, 3, AxisMode::SeparateDims);
        assert_eq!(min, vec![0.0; 3]);
        assert_eq!(max, vec![0.0; 3]);
    }

    #[test]
    fn test_check_quant_bits() {
        assert!(check_quant_bits(1).is_ok());
        assert!(check_quant_bits(24).is_ok());
        assert_eq!(check_quant_bits(0), Err(CodecError::InvalidQuantBits(0)));
        assert_eq!(check_quant_bits(25), Err(CodecError::InvalidQuantBits(25)));
    }
}
