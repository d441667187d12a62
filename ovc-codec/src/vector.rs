//! Dynamic vector codec
//!
//! Compresses a sequence of fixed-width float vectors (animation keyframe
//! times and values). Every component is quantized against its own axis range
//! and predicted from the same component of the previous vector.

use crate::bitstream::{StreamReader, StreamWriter};
use crate::{
    check_quant_bits, compute_min_max, dequantize, quantize, AxisMode, CodecError, StreamType,
    FORMAT_VERSION, VECTOR_MAGIC,
};

/// Borrowed input for [`encode_dynamic_vector`]
///
/// Vector `i` starts at `vectors[i * stride]` and holds `dim` components.
#[derive(Debug, Clone, Copy)]
pub struct DynamicVector<'a> {
    pub vectors: &'a [f32],
    pub count: usize,
    pub dim: usize,
    pub stride: usize,
}

impl<'a> DynamicVector<'a> {
    /// Tightly packed vectors (`stride == dim`)
    pub fn packed(vectors: &'a [f32], count: usize, dim: usize) -> Self {
        Self {
            vectors,
            count,
            dim,
            stride: dim,
        }
    }

    fn required_len(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.count - 1) * self.stride + self.dim
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorEncodeParams {
    pub quant_bits: u32,
    pub stream_type: StreamType,
}

impl VectorEncodeParams {
    pub fn new(quant_bits: u32, stream_type: StreamType) -> Self {
        Self {
            quant_bits,
            stream_type,
        }
    }
}

/// Encode a dynamic vector into a self-describing payload
pub fn encode_dynamic_vector(
    vector: &DynamicVector<'_>,
    params: &VectorEncodeParams,
) -> Result<Vec<u8>, CodecError> {
    if vector.dim == 0 {
        return Err(CodecError::ZeroDimension);
    }
    if vector.stride < vector.dim {
        return Err(CodecError::BufferTooSmall {
            expected: vector.dim,
            actual: vector.stride,
        });
    }
    check_quant_bits(params.quant_bits)?;
    let expected = vector.required_len();
    if vector.vectors.len() < expected {
        return Err(CodecError::BufferTooSmall {
            expected,
            actual: vector.vectors.len(),
        });
    }

    let (min, max) = compute_min_max(
        vector.vectors,
        vector.count,
        vector.dim,
        vector.stride,
        AxisMode::SeparateDims,
    );
    let bits = params.quant_bits;

    let mut w = StreamWriter::new(VECTOR_MAGIC, params.stream_type, vector.count * vector.dim * 2);
    w.write_u32(FORMAT_VERSION);
    w.write_u64(vector.count as u64);
    w.write_u32(vector.dim as u32);
    w.write_u32(bits);
    for &v in &min {
        w.write_f32(v);
    }
    for &v in &max {
        w.write_f32(v);
    }

    let mut previous = vec![0i64; vector.dim];
    for i in 0..vector.count {
        let base = i * vector.stride;
        for d in 0..vector.dim {
            let q = quantize(vector.vectors[base + d], min[d], max[d], bits);
            w.write_i64(q - previous[d]);
            previous[d] = q;
        }
    }

    Ok(w.finish())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicVectorHeader {
    pub stream_type: StreamType,
    pub count: usize,
    pub dim: usize,
    pub quant_bits: u32,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl DynamicVectorHeader {
    /// Number of floats the payload decodes to
    pub fn len(&self) -> usize {
        self.count * self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Header-first dynamic vector decoder
pub struct DynamicVectorDecoder<'a> {
    reader: StreamReader<'a>,
    header: DynamicVectorHeader,
}

impl<'a> DynamicVectorDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, CodecError> {
        let mut reader = StreamReader::new(data, VECTOR_MAGIC)?;

        let version = reader.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let count = reader.read_usize()?;
        let dim = reader.read_usize()?;
        if dim == 0 {
            return Err(CodecError::ZeroDimension);
        }
        let quant_bits = reader.read_u32()?;
        check_quant_bits(quant_bits)?;
        let min = (0..dim).map(|_| reader.read_f32()).collect::<Result<Vec<_>, _>>()?;
        let max = (0..dim).map(|_| reader.read_f32()).collect::<Result<Vec<_>, _>>()?;

        let header = DynamicVectorHeader {
            stream_type: reader.stream_type(),
            count,
            dim,
            quant_bits,
            min,
            max,
        };
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &DynamicVectorHeader {
        &self.header
    }

    /// Decode every vector into `out`, tightly packed
    pub fn decode_payload(mut self, out: &mut [f32]) -> Result<(), CodecError> {
        let header = &self.header;
        if out.len() < header.len() {
            return Err(CodecError::TargetTooSmall {
                expected: header.len(),
                actual: out.len(),
            });
        }

        let dim = header.dim;
        let mut previous = vec![0i64; dim];
        for (i, dst) in out[..header.len()].iter_mut().enumerate() {
            let d = i % dim;
            let q = previous[d] + self.reader.read_i64()?;
            previous[d] = q;
            *dst = dequantize(q, header.min[d], header.max[d], header.quant_bits);
        }
        Ok(())
    }
}
