//! Mesh model, primitive flattening and attribute slot collection

mod attributes;
mod flatten;
mod types;

// Re-export public API
pub use attributes::{
    collect_attributes, float_attribute_type, AttributeSlot, AttributeTable, QuantizationConfig,
    SlotTarget,
};
pub use flatten::{can_compress, flatten_primitives, FlattenedGeometry};
pub(crate) use flatten::first_ineligible;
pub use types::{Mesh, MeshAttribute, Primitive, PrimitiveKind, Semantic};
