//! Geometry compression adapter
//!
//! Flattens a mesh, maps its attributes onto codec slots, encodes the face set
//! and appends the payload to the context's compression stream.

use std::io::Write;

use ovc_codec::{encode_mesh, AxisMode, EncodeParams, FloatAttribute, IndexedFaceSet, Slot};
use tracing::{debug, error, info, warn};

use crate::context::ConverterContext;
use crate::dump::dump_face_set;
use crate::error::{to_u32, CompressionError};
use crate::formats::CompressedData;
use crate::mesh::{
    can_compress, collect_attributes, first_ineligible, flatten_primitives, float_attribute_type,
    AttributeSlot, AttributeTable, FlattenedGeometry, Mesh,
};
use crate::profile::UNSIGNED_BYTE;
use crate::verify::verify_geometry;

/// Compress `mesh` when compression is enabled and every primitive is a
/// triangle list; otherwise leave it untouched and return `None`
pub fn compress_mesh_if_eligible<W: Write>(
    mesh: &mut Mesh<'_>,
    ctx: &mut ConverterContext<W>,
) -> Result<Option<CompressedData>, CompressionError> {
    if !ctx.settings.compression_enabled() {
        info!("Mesh '{}': compression disabled, skipping", mesh.id);
        return Ok(None);
    }
    if !can_compress(mesh) {
        info!("Mesh '{}': has non-triangle primitives, skipping compression", mesh.id);
        return Ok(None);
    }
    encode_geometry(mesh, ctx).map(Some)
}

/// Encode `mesh` into the compression stream and attach the metadata to its
/// extension tree
///
/// The stream is only advanced by a complete payload, and the metadata is
/// only attached after the write succeeded.
pub fn encode_geometry<W: Write>(
    mesh: &mut Mesh<'_>,
    ctx: &mut ConverterContext<W>,
) -> Result<CompressedData, CompressionError> {
    let data = write_geometry(mesh, ctx)?;
    data.attach(&mut mesh.extensions)?;
    Ok(data)
}

fn write_geometry<W: Write>(
    mesh: &Mesh<'_>,
    ctx: &mut ConverterContext<W>,
) -> Result<CompressedData, CompressionError> {
    if let Some((primitive, kind)) = first_ineligible(mesh) {
        return Err(CompressionError::Ineligible {
            mesh: mesh.id.clone(),
            primitive,
            kind: kind.as_str(),
        });
    }

    let flat = flatten_primitives(&mesh.primitives)?;
    let table = collect_attributes(mesh, ctx.settings.strict_vertex_counts)?;
    let ifs = build_face_set(&flat, &table, ctx.settings.axis_mode.into());

    if let Some(dir) = ctx.settings.dump_dir.clone() {
        let index = ctx.next_dump_index();
        match dump_face_set(&dir, index, &ifs) {
            Ok(path) => debug!("Mesh '{}': dumped face set to {}", mesh.id, path.display()),
            Err(e) => warn!("Mesh '{}': failed to dump face set: {}", mesh.id, e),
        }
    }

    let mode = ctx.settings.mode;
    let payload = encode_mesh(&ifs, &EncodeParams::new(mode.into()))?;

    let stream = &mut ctx.compression_stream;
    let offset = stream.len();
    let byte_offset = to_u32(offset)?;
    let count = to_u32(payload.len() as u64)?;
    to_u32(offset + payload.len() as u64)?;
    stream.write_all(&payload)?;

    info!(
        "Mesh '{}': {} vertices, {} triangles -> {} bytes at offset {}",
        mesh.id,
        table.vertex_count,
        flat.triangle_count(),
        count,
        byte_offset
    );

    let data = CompressedData {
        vertices_count: Some(to_u32(table.vertex_count as u64)?),
        indices_count: Some(to_u32(flat.indices.len() as u64)?),
        mode,
        count,
        component_type: UNSIGNED_BYTE,
        byte_offset,
        float_attributes_indexes: Some(table.float_attribute_indexes.clone()),
    };

    if ctx.settings.verify_round_trip {
        if let Err(e) = verify_geometry(mesh, &payload) {
            error!("Mesh '{}': round trip decode failed: {}", mesh.id, e);
        }
    }

    Ok(data)
}

fn build_face_set<'a>(
    flat: &'a FlattenedGeometry,
    table: &AttributeTable<'a>,
    axis_mode: AxisMode,
) -> IndexedFaceSet<'a> {
    let mut ifs = IndexedFaceSet::new(&flat.indices, &flat.primitive_ids);
    ifs.coord = table.coord.as_ref().map(slot);
    ifs.normal = table.normal.as_ref().map(slot);
    ifs.float_attributes = table
        .float_slots
        .iter()
        .map(|s| FloatAttribute {
            kind: float_attribute_type(s.semantic),
            slot: slot(s),
        })
        .collect();
    ifs.compute_min_max(axis_mode);
    ifs
}

fn slot<'a>(s: &AttributeSlot<'a>) -> Slot<'a> {
    Slot::new(
        s.data,
        s.count,
        s.dim,
        s.quantization.quant_bits,
        s.quantization.prediction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshAttribute, Primitive, PrimitiveKind, Semantic};
    use crate::settings::{CompressionSettings, CompressionType, EncodingMode};

    static POSITIONS: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
    static UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    static INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

    fn quad() -> Mesh<'static> {
        let mut mesh = Mesh::new("quad");
        mesh.add_primitive(Primitive::triangles(&INDICES[..3]));
        mesh.add_primitive(Primitive::triangles(&INDICES[3..]));
        mesh.add_attribute(Semantic::Position, MeshAttribute::new("pos", &POSITIONS, 3));
        mesh.add_attribute(Semantic::TexCoord, MeshAttribute::new("uv", &UVS, 2));
        mesh
    }

    #[test]
    fn test_encode_geometry_metadata() {
        let mut ctx = ConverterContext::in_memory(CompressionSettings::default());
        ctx.compression_stream.write_all(b"head").unwrap();

        let mut mesh = quad();
        let data = encode_geometry(&mut mesh, &mut ctx).unwrap();

        assert_eq!(data.vertices_count, Some(4));
        assert_eq!(data.indices_count, Some(6));
        assert_eq!(data.mode, EncodingMode::Binary);
        assert_eq!(data.component_type, 5121);
        assert_eq!(data.byte_offset, 4);
        assert_eq!(data.count as u64, ctx.compression_stream.len() - 4);
        assert_eq!(data.float_attributes_indexes.as_ref().unwrap()["uv"], 0);

        let attached = CompressedData::from_extensions(&mesh.extensions).unwrap().unwrap();
        assert_eq!(attached, data);
    }

    #[test]
    fn test_ineligible_mesh_is_rejected_whole() {
        let mut ctx = ConverterContext::in_memory(CompressionSettings::default());
        let mut mesh = quad();
        mesh.add_primitive(Primitive {
            kind: PrimitiveKind::Lines,
            indices: &INDICES[..2],
        });

        let err = encode_geometry(&mut mesh, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            CompressionError::Ineligible {
                primitive: 2,
                kind: "LINES",
                ..
            }
        ));
        assert!(ctx.compression_stream.is_empty());
        assert!(mesh.extensions.is_empty());

        assert_eq!(compress_mesh_if_eligible(&mut mesh, &mut ctx).unwrap(), None);
        assert!(ctx.compression_stream.is_empty());
    }

    #[test]
    fn test_disabled_compression_skips() {
        let settings = CompressionSettings {
            compression_type: CompressionType::None,
            ..Default::default()
        };
        let mut ctx = ConverterContext::in_memory(settings);
        let mut mesh = quad();
        assert_eq!(compress_mesh_if_eligible(&mut mesh, &mut ctx).unwrap(), None);
        assert!(mesh.extensions.is_empty());
    }

    #[test]
    fn test_strict_count_mismatch_writes_nothing() {
        let short_uvs = [0.0f32; 6];
        let settings = CompressionSettings {
            strict_vertex_counts: true,
            ..Default::default()
        };
        let mut ctx = ConverterContext::in_memory(settings);
        let mut mesh = Mesh::new("bad");
        mesh.add_primitive(Primitive::triangles(&INDICES));
        mesh.add_attribute(Semantic::Position, MeshAttribute::new("pos", &POSITIONS, 3));
        mesh.add_attribute(Semantic::TexCoord, MeshAttribute::new("uv", &short_uvs, 2));

        let err = encode_geometry(&mut mesh, &mut ctx).unwrap_err();
        assert!(matches!(err, CompressionError::VertexCountMismatch { .. }));
        assert!(ctx.compression_stream.is_empty());
    }
}
