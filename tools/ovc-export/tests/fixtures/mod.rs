//! Programmatic test assets for the compression pipeline.
//!
//! Provides:
//! - Skinned stacked-box mesh (positions, normals, UVs, joints, weights),
//!   one triangle-list primitive per segment
//! - 30-frame wave animation (times, translations, rotations)

mod animation_data;
mod mesh_data;

#[allow(unused_imports)]
pub use animation_data::{create_animation, AnimationData, FRAME_COUNT};
#[allow(unused_imports)]
pub use mesh_data::{create_mesh_data, MeshData, SEGMENT_COUNT, VERTS_PER_SEGMENT};
