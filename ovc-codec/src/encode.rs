//! Mesh encoder implementation
//!
//! Writes the header (slot layout, quantization, bounds) followed by the
//! connectivity and the per-slot prediction residuals.

use crate::bitstream::StreamWriter;
use crate::predict::{predict, traverse};
use crate::{
    check_quant_bits, compute_min_max, quantize, AxisMode, CodecError, EncodeParams,
    IndexedFaceSet, Slot, FORMAT_VERSION, MAX_FLOAT_ATTRIBUTES, MESH_MAGIC,
};

/// Encode an indexed face set into a self-describing payload
///
/// # Arguments
/// * `ifs` - Borrowed connectivity and attribute slots
/// * `params` - Stream type
///
/// # Returns
/// The payload bytes. Slots without precomputed bounds get per-axis bounds.
pub fn encode_mesh(ifs: &IndexedFaceSet<'_>, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
    validate(ifs)?;

    let vertex_hint = ifs.coord.as_ref().map(|s| s.count).unwrap_or(0);
    let mut w = StreamWriter::new(
        MESH_MAGIC,
        params.stream_type,
        ifs.coord_index.len() * 2 + vertex_hint * 8,
    );

    // Header
    w.write_u32(FORMAT_VERSION);
    w.write_u64(ifs.triangle_count() as u64);

    let coord_bounds = ifs.coord.as_ref().map(bounds_of);
    let normal_bounds = ifs.normal.as_ref().map(bounds_of);
    let float_bounds: Vec<_> = ifs.float_attributes.iter().map(|a| bounds_of(&a.slot)).collect();

    write_optional_slot_header(&mut w, ifs.coord.as_ref(), coord_bounds.as_ref());
    write_optional_slot_header(&mut w, ifs.normal.as_ref(), normal_bounds.as_ref());

    w.write_u32(ifs.float_attributes.len() as u32);
    for (attribute, bounds) in ifs.float_attributes.iter().zip(&float_bounds) {
        w.write_u32(attribute.kind.code());
        write_slot_header(&mut w, &attribute.slot, bounds);
    }

    // Connectivity
    let mut previous = 0i64;
    for &index in ifs.coord_index {
        w.write_i64(index as i64 - previous);
        previous = index as i64;
    }
    write_triangle_ids(&mut w, ifs.index_buffer_ids);

    // Attributes
    if let (Some(slot), Some(bounds)) = (ifs.coord.as_ref(), coord_bounds.as_ref()) {
        write_residuals(&mut w, ifs.coord_index, slot, bounds);
    }
    if let (Some(slot), Some(bounds)) = (ifs.normal.as_ref(), normal_bounds.as_ref()) {
        write_residuals(&mut w, ifs.coord_index, slot, bounds);
    }
    for (attribute, bounds) in ifs.float_attributes.iter().zip(&float_bounds) {
        write_residuals(&mut w, ifs.coord_index, &attribute.slot, bounds);
    }

    Ok(w.finish())
}

type Bounds = (Vec<f32>, Vec<f32>);

fn bounds_of(slot: &Slot<'_>) -> Bounds {
    if slot.has_bounds() {
        (slot.min.clone(), slot.max.clone())
    } else {
        compute_min_max(slot.data, slot.count, slot.dim, slot.dim, AxisMode::SeparateDims)
    }
}

fn validate(ifs: &IndexedFaceSet<'_>) -> Result<(), CodecError> {
    if ifs.coord_index.len() % 3 != 0 {
        return Err(CodecError::IndexCountNotTriangles(ifs.coord_index.len()));
    }
    if ifs.index_buffer_ids.len() != ifs.triangle_count() {
        return Err(CodecError::MismatchedTriangleIds {
            triangles: ifs.triangle_count(),
            ids: ifs.index_buffer_ids.len(),
        });
    }
    if ifs.float_attributes.len() > MAX_FLOAT_ATTRIBUTES {
        return Err(CodecError::TooManyFloatAttributes(ifs.float_attributes.len()));
    }

    let slots = ifs
        .coord
        .iter()
        .chain(ifs.normal.iter())
        .chain(ifs.float_attributes.iter().map(|a| &a.slot));
    for slot in slots {
        if slot.dim == 0 {
            return Err(CodecError::ZeroDimension);
        }
        check_quant_bits(slot.quant_bits)?;
        let expected = slot.count * slot.dim;
        if slot.data.len() < expected {
            return Err(CodecError::BufferTooSmall {
                expected,
                actual: slot.data.len(),
            });
        }
    }
    Ok(())
}

fn write_optional_slot_header(w: &mut StreamWriter, slot: Option<&Slot<'_>>, bounds: Option<&Bounds>) {
    match (slot, bounds) {
        (Some(slot), Some(bounds)) if slot.count > 0 => write_slot_header(w, slot, bounds),
        _ => w.write_u64(0),
    }
}

fn write_slot_header(w: &mut StreamWriter, slot: &Slot<'_>, (min, max): &Bounds) {
    w.write_u64(slot.count as u64);
    w.write_u32(slot.dim as u32);
    w.write_u32(slot.quant_bits);
    w.write_u32(slot.prediction.code());
    for &v in min {
        w.write_f32(v);
    }
    for &v in max {
        w.write_f32(v);
    }
}

/// Run-length encode the per-triangle primitive tags as (id, run) pairs
fn write_triangle_ids(w: &mut StreamWriter, ids: &[u32]) {
    let mut runs: Vec<(u32, u64)> = Vec::new();
    for &id in ids {
        match runs.last_mut() {
            Some((last, len)) if *last == id => *len += 1,
            _ => runs.push((id, 1)),
        }
    }
    w.write_u64(runs.len() as u64);
    for (id, len) in runs {
        w.write_u32(id);
        w.write_u64(len);
    }
}

fn write_residuals(w: &mut StreamWriter, triangles: &[u16], slot: &Slot<'_>, (min, max): &Bounds) {
    if slot.count == 0 {
        return;
    }
    let dim = slot.dim;
    let bits = slot.quant_bits;

    let mut values = vec![0i64; slot.count * dim];
    for (i, value) in values.iter_mut().enumerate() {
        let d = i % dim;
        *value = quantize(slot.data[i], min[d], max[d], bits);
    }

    for visit in traverse(triangles, slot.count) {
        let base = visit.vertex as usize * dim;
        for d in 0..dim {
            let predicted = predict(slot.prediction, visit.context, &values, dim, d, bits);
            w.write_i64(values[base + d] - predicted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FloatAttribute, FloatAttributeType, PredictionMode, StreamType};

    #[test]
    fn test_rejects_partial_triangle() {
        let indices = [0u16, 1];
        let ifs = IndexedFaceSet::new(&indices, &[]);
        assert_eq!(
            encode_mesh(&ifs, &EncodeParams::default()),
            Err(CodecError::IndexCountNotTriangles(2))
        );
    }

    #[test]
    fn test_rejects_mismatched_ids() {
        let indices = [0u16, 1, 2];
        let ifs = IndexedFaceSet::new(&indices, &[0, 0]);
        assert_eq!(
            encode_mesh(&ifs, &EncodeParams::default()),
            Err(CodecError::MismatchedTriangleIds {
                triangles: 1,
                ids: 2
            })
        );
    }

    #[test]
    fn test_rejects_short_buffer() {
        let indices = [0u16, 1, 2];
        let positions = [0.0f32; 6];
        let mut ifs = IndexedFaceSet::new(&indices, &[0]);
        ifs.coord = Some(Slot::new(&positions, 3, 3, 12, PredictionMode::Parallelogram));
        assert_eq!(
            encode_mesh(&ifs, &EncodeParams::default()),
            Err(CodecError::BufferTooSmall {
                expected: 9,
                actual: 6
            })
        );
    }

    #[test]
    fn test_rejects_bad_quant_bits() {
        let indices = [0u16, 1, 2];
        let uvs = [0.0f32; 6];
        let mut ifs = IndexedFaceSet::new(&indices, &[0]);
        ifs.float_attributes.push(FloatAttribute {
            kind: FloatAttributeType::TexCoord,
            slot: Slot::new(&uvs, 3, 2, 0, PredictionMode::Parallelogram),
        });
        assert_eq!(
            encode_mesh(&ifs, &EncodeParams::default()),
            Err(CodecError::InvalidQuantBits(0))
        );
    }

    #[test]
    fn test_empty_face_set_encodes() {
        let ifs = IndexedFaceSet::new(&[], &[]);
        let payload = encode_mesh(&ifs, &EncodeParams::new(StreamType::Ascii)).unwrap();
        assert_eq!(&payload[0..5], b"OVCMA");
    }
}
