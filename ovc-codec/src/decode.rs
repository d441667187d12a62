//! Mesh decoder implementation
//!
//! Decoding is split in two steps: [`MeshDecoder::new`] reads the header so the
//! caller can size its output buffers, then [`MeshDecoder::decode_payload`]
//! fills caller-provided slices.

use crate::bitstream::StreamReader;
use crate::predict::{predict, traverse};
use crate::{
    check_quant_bits, dequantize, CodecError, FloatAttributeType, PredictionMode, StreamType,
    FORMAT_VERSION, MAX_FLOAT_ATTRIBUTES, MESH_MAGIC,
};

/// Layout of one decoded slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotHeader {
    pub count: usize,
    pub dim: usize,
    pub quant_bits: u32,
    pub prediction: PredictionMode,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl SlotHeader {
    /// Number of floats the slot decodes to
    pub fn len(&self) -> usize {
        self.count * self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Layout of one decoded numbered float attribute
#[derive(Debug, Clone, PartialEq)]
pub struct FloatSlotHeader {
    pub kind: FloatAttributeType,
    pub slot: SlotHeader,
}

/// Everything needed to size the decode buffers
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHeader {
    pub stream_type: StreamType,
    pub triangle_count: usize,
    pub coord: Option<SlotHeader>,
    pub normal: Option<SlotHeader>,
    pub float_attributes: Vec<FloatSlotHeader>,
}

impl MeshHeader {
    pub fn index_count(&self) -> usize {
        self.triangle_count * 3
    }

    pub fn coord_count(&self) -> usize {
        self.coord.as_ref().map(|s| s.count).unwrap_or(0)
    }

    pub fn normal_count(&self) -> usize {
        self.normal.as_ref().map(|s| s.count).unwrap_or(0)
    }
}

/// Caller-owned destination slices for one decode
///
/// Slots left as `None` are decoded and discarded.
pub struct MeshTarget<'b> {
    pub coord_index: &'b mut [u16],
    pub index_buffer_ids: Option<&'b mut [u32]>,
    pub coord: Option<&'b mut [f32]>,
    pub normal: Option<&'b mut [f32]>,
    pub float_attributes: Vec<Option<&'b mut [f32]>>,
}

impl<'b> MeshTarget<'b> {
    pub fn new(coord_index: &'b mut [u16]) -> Self {
        Self {
            coord_index,
            index_buffer_ids: None,
            coord: None,
            normal: None,
            float_attributes: Vec::new(),
        }
    }
}

/// Header-first mesh decoder
pub struct MeshDecoder<'a> {
    reader: StreamReader<'a>,
    header: MeshHeader,
}

impl<'a> MeshDecoder<'a> {
    /// Read and validate the payload header
    pub fn new(data: &'a [u8]) -> Result<Self, CodecError> {
        let mut reader = StreamReader::new(data, MESH_MAGIC)?;

        let version = reader.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let triangle_count = reader.read_usize()?;
        let coord = read_optional_slot_header(&mut reader)?;
        let normal = read_optional_slot_header(&mut reader)?;

        let float_count = reader.read_usize()?;
        if float_count > MAX_FLOAT_ATTRIBUTES {
            return Err(CodecError::TooManyFloatAttributes(float_count));
        }
        let mut float_attributes = Vec::with_capacity(float_count);
        for _ in 0..float_count {
            let kind = FloatAttributeType::from_code(reader.read_u32()?)?;
            let count = reader.read_usize()?;
            let slot = read_slot_header(&mut reader, count)?;
            float_attributes.push(FloatSlotHeader { kind, slot });
        }

        let header = MeshHeader {
            stream_type: reader.stream_type(),
            triangle_count,
            coord,
            normal,
            float_attributes,
        };

        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &MeshHeader {
        &self.header
    }

    /// Decode connectivity and every slot into `target`
    pub fn decode_payload(mut self, target: &mut MeshTarget<'_>) -> Result<(), CodecError> {
        let MeshTarget {
            coord_index,
            index_buffer_ids,
            coord,
            normal,
            float_attributes,
        } = target;

        let index_count = self.header.index_count();
        check_target(coord_index.len(), index_count)?;

        let mut previous = 0i64;
        for slot in coord_index[..index_count].iter_mut() {
            let value = previous + self.reader.read_i64()?;
            *slot = u16::try_from(value).map_err(|_| CodecError::MalformedToken)?;
            previous = value;
        }

        read_triangle_ids(
            &mut self.reader,
            self.header.triangle_count,
            index_buffer_ids.as_deref_mut(),
        )?;

        let triangles: &[u16] = &coord_index[..index_count];

        if let Some(header) = self.header.coord.as_ref() {
            read_residuals(&mut self.reader, triangles, header, coord.as_deref_mut())?;
        }
        if let Some(header) = self.header.normal.as_ref() {
            read_residuals(&mut self.reader, triangles, header, normal.as_deref_mut())?;
        }
        for (i, attribute) in self.header.float_attributes.iter().enumerate() {
            let out = float_attributes.get_mut(i).and_then(|o| o.as_deref_mut());
            read_residuals(&mut self.reader, triangles, &attribute.slot, out)?;
        }

        Ok(())
    }
}

fn check_target(actual: usize, expected: usize) -> Result<(), CodecError> {
    if actual < expected {
        return Err(CodecError::TargetTooSmall { expected, actual });
    }
    Ok(())
}

fn read_optional_slot_header(reader: &mut StreamReader<'_>) -> Result<Option<SlotHeader>, CodecError> {
    let count = reader.read_usize()?;
    if count == 0 {
        return Ok(None);
    }
    read_slot_header(reader, count).map(Some)
}

fn read_slot_header(reader: &mut StreamReader<'_>, count: usize) -> Result<SlotHeader, CodecError> {
    let dim = reader.read_usize()?;
    if dim == 0 {
        return Err(CodecError::ZeroDimension);
    }
    let quant_bits = reader.read_u32()?;
    check_quant_bits(quant_bits)?;
    let prediction = PredictionMode::from_code(reader.read_u32()?)?;

    let min = (0..dim).map(|_| reader.read_f32()).collect::<Result<Vec<_>, _>>()?;
    let max = (0..dim).map(|_| reader.read_f32()).collect::<Result<Vec<_>, _>>()?;

    Ok(SlotHeader {
        count,
        dim,
        quant_bits,
        prediction,
        min,
        max,
    })
}

fn read_triangle_ids(
    reader: &mut StreamReader<'_>,
    triangle_count: usize,
    mut out: Option<&mut [u32]>,
) -> Result<(), CodecError> {
    if let Some(out) = out.as_deref() {
        check_target(out.len(), triangle_count)?;
    }

    let runs = reader.read_usize()?;
    let mut filled = 0usize;
    for _ in 0..runs {
        let id = reader.read_u32()?;
        let len = reader.read_usize()?;
        let end = filled.checked_add(len).ok_or(CodecError::MalformedToken)?;
        if end > triangle_count {
            return Err(CodecError::MalformedToken);
        }
        if let Some(out) = out.as_deref_mut() {
            out[filled..end].fill(id);
        }
        filled = end;
    }

    if filled != triangle_count {
        return Err(CodecError::MalformedToken);
    }
    Ok(())
}

fn read_residuals(
    reader: &mut StreamReader<'_>,
    triangles: &[u16],
    header: &SlotHeader,
    out: Option<&mut [f32]>,
) -> Result<(), CodecError> {
    if header.count == 0 {
        return Ok(());
    }
    if let Some(out) = out.as_deref() {
        check_target(out.len(), header.len())?;
    }

    let dim = header.dim;
    let bits = header.quant_bits;
    let mut values = vec![0i64; header.len()];

    for visit in traverse(triangles, header.count) {
        let base = visit.vertex as usize * dim;
        for d in 0..dim {
            let predicted = predict(header.prediction, visit.context, &values, dim, d, bits);
            values[base + d] = predicted + reader.read_i64()?;
        }
    }

    if let Some(out) = out {
        for (i, (dst, &q)) in out.iter_mut().zip(&values).enumerate() {
            let d = i % dim;
            *dst = dequantize(q, header.min[d], header.max[d], bits);
        }
    }
    Ok(())
}
