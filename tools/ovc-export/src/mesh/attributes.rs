//! Semantic attribute collection
//!
//! Maps semantic-tagged mesh attributes onto codec slots: position and normal
//! get the dedicated slots, everything else takes the next numbered float
//! attribute slot in collection order.

use std::collections::BTreeMap;

use ovc_codec::{FloatAttributeType, PredictionMode};
use tracing::{debug, warn};

use super::types::{Mesh, MeshAttribute, Semantic};
use crate::error::CompressionError;

/// Quantization applied to one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationConfig {
    pub quant_bits: u32,
    pub prediction: PredictionMode,
}

impl QuantizationConfig {
    pub fn for_semantic(semantic: Semantic) -> Self {
        let (quant_bits, prediction) = match semantic {
            Semantic::Position => (12, PredictionMode::Parallelogram),
            Semantic::Normal => (10, PredictionMode::SurfaceNormals),
            Semantic::TexCoord => (10, PredictionMode::Parallelogram),
            Semantic::Color => (10, PredictionMode::Parallelogram),
            Semantic::Weight => (8, PredictionMode::Differential),
            // Joint indices are quantized as floats
            Semantic::Joint => (10, PredictionMode::Parallelogram),
        };
        Self {
            quant_bits,
            prediction,
        }
    }
}

/// Codec slot an attribute is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    Coord,
    Normal,
    Float(u32),
}

/// Hint stored with a numbered float slot
pub fn float_attribute_type(semantic: Semantic) -> FloatAttributeType {
    match semantic {
        Semantic::TexCoord => FloatAttributeType::TexCoord,
        Semantic::Color => FloatAttributeType::Color,
        Semantic::Weight => FloatAttributeType::Weight,
        _ => FloatAttributeType::Unknown,
    }
}

/// One codec-facing slot, borrowing its buffer from the mesh
#[derive(Debug, Clone)]
pub struct AttributeSlot<'m> {
    pub attribute_id: &'m str,
    pub semantic: Semantic,
    pub target: SlotTarget,
    pub quantization: QuantizationConfig,
    pub data: &'m [f32],
    pub count: usize,
    pub dim: usize,
}

impl<'m> AttributeSlot<'m> {
    fn new(
        attribute: &'m MeshAttribute<'_>,
        semantic: Semantic,
        target: SlotTarget,
    ) -> Self {
        Self {
            attribute_id: &attribute.id,
            semantic,
            target,
            quantization: QuantizationConfig::for_semantic(semantic),
            data: attribute.data,
            count: attribute.count,
            dim: attribute.components,
        }
    }
}

/// Numbered float slot counter threaded through one collection pass
#[derive(Debug, Default)]
struct SlotAccumulator {
    next: u32,
}

impl SlotAccumulator {
    fn assign(&mut self) -> u32 {
        let slot = self.next;
        self.next += 1;
        slot
    }
}

/// Result of collecting every attribute of a mesh
#[derive(Debug, Clone, Default)]
pub struct AttributeTable<'m> {
    pub coord: Option<AttributeSlot<'m>>,
    pub normal: Option<AttributeSlot<'m>>,
    /// Numbered slots, index == slot number
    pub float_slots: Vec<AttributeSlot<'m>>,
    /// Attribute id -> numbered slot, persisted as decode metadata
    pub float_attribute_indexes: BTreeMap<String, u32>,
    pub vertex_count: usize,
}

/// Build the slot table for `mesh`
///
/// The vertex count is the position count, or the first attribute's count
/// when there is no position. With `strict` set, any per-vertex attribute
/// with a different count is rejected; otherwise it is logged and kept.
pub fn collect_attributes<'m>(
    mesh: &'m Mesh<'_>,
    strict: bool,
) -> Result<AttributeTable<'m>, CompressionError> {
    let vertex_count = Semantic::ALL
        .iter()
        .find_map(|&s| mesh.attributes(s).first())
        .map(|a| a.count)
        .unwrap_or(0);

    let mut table = AttributeTable {
        vertex_count,
        ..Default::default()
    };
    let mut slots = SlotAccumulator::default();

    for semantic in Semantic::ALL {
        for attribute in mesh.attributes(semantic) {
            check_vertex_count(mesh, attribute, vertex_count, strict)?;

            match semantic {
                Semantic::Position | Semantic::Normal => {
                    let (dest, target) = if semantic == Semantic::Position {
                        (&mut table.coord, SlotTarget::Coord)
                    } else {
                        (&mut table.normal, SlotTarget::Normal)
                    };
                    if dest.is_some() {
                        warn!(
                            "Mesh '{}': ignoring extra {} attribute '{}'",
                            mesh.id,
                            semantic.as_str(),
                            attribute.id
                        );
                        continue;
                    }
                    *dest = Some(AttributeSlot::new(attribute, semantic, target));
                }
                _ => {
                    let slot = slots.assign();
                    debug!(
                        "Mesh '{}': {} '{}' -> float slot {}",
                        mesh.id,
                        semantic.as_str(),
                        attribute.id,
                        slot
                    );
                    table
                        .float_attribute_indexes
                        .insert(attribute.id.clone(), slot);
                    table
                        .float_slots
                        .push(AttributeSlot::new(attribute, semantic, SlotTarget::Float(slot)));
                }
            }
        }
    }

    Ok(table)
}

fn check_vertex_count(
    mesh: &Mesh<'_>,
    attribute: &MeshAttribute<'_>,
    expected: usize,
    strict: bool,
) -> Result<(), CompressionError> {
    if attribute.count == expected {
        return Ok(());
    }
    if strict {
        return Err(CompressionError::VertexCountMismatch {
            attribute: attribute.id.clone(),
            expected,
            actual: attribute.count,
        });
    }
    warn!(
        "Mesh '{}': attribute '{}' has {} elements, expected {}",
        mesh.id, attribute.id, attribute.count, expected
    );
    Ok(())
}
