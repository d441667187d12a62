//! Primitive flattening
//!
//! Concatenates the triangle lists of every primitive into one index buffer
//! and tags each triangle with the primitive it came from.

use tracing::warn;

use super::types::{Mesh, Primitive, PrimitiveKind};
use crate::error::{scratch, CompressionError};

/// True when every primitive is a triangle list
pub fn can_compress(mesh: &Mesh<'_>) -> bool {
    first_ineligible(mesh).is_none()
}

/// Index and kind of the first primitive that is not a triangle list
pub(crate) fn first_ineligible(mesh: &Mesh<'_>) -> Option<(usize, PrimitiveKind)> {
    mesh.primitives
        .iter()
        .enumerate()
        .find(|(_, p)| p.kind != PrimitiveKind::Triangles)
        .map(|(i, p)| (i, p.kind))
}

/// Scratch connectivity for one encode call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedGeometry {
    /// Concatenated triangle indices
    pub indices: Vec<u16>,
    /// Primitive index per triangle
    pub primitive_ids: Vec<u32>,
}

impl FlattenedGeometry {
    pub fn triangle_count(&self) -> usize {
        self.primitive_ids.len()
    }
}

/// Merge triangle-list primitives, in primitive order then triangle order
///
/// Indices past the last whole triangle of a primitive are dropped.
pub fn flatten_primitives(primitives: &[Primitive<'_>]) -> Result<FlattenedGeometry, CompressionError> {
    let triangle_count: usize = primitives.iter().map(|p| p.indices.len() / 3).sum();

    let mut indices = scratch("flattened indices", triangle_count * 3)?;
    let mut primitive_ids = scratch("primitive ids", triangle_count)?;

    for (id, primitive) in primitives.iter().enumerate() {
        let whole = primitive.indices.len() / 3 * 3;
        if whole != primitive.indices.len() {
            warn!(
                "Primitive {} has {} indices, dropping {} trailing",
                id,
                primitive.indices.len(),
                primitive.indices.len() - whole
            );
        }
        indices.extend_from_slice(&primitive.indices[..whole]);
        primitive_ids.extend(std::iter::repeat_n(id as u32, whole / 3));
    }

    Ok(FlattenedGeometry {
        indices,
        primitive_ids,
    })
}
