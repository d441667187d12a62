//! Stacked box mesh with skinning data.

use ovc_export::{Mesh, MeshAttribute, Primitive, Semantic};

/// Number of stacked boxes (and primitives, and bones)
pub const SEGMENT_COUNT: usize = 3;
/// 6 faces x 4 corners
pub const VERTS_PER_SEGMENT: usize = 24;
/// Height of each box
const SEGMENT_HEIGHT: f32 = 1.0;

/// Owned buffers the borrowed [`Mesh`] view points into
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    /// Joint indices stored as floats
    pub joints: Vec<f32>,
    pub weights: Vec<f32>,
    /// One triangle list per segment
    pub primitives: Vec<Vec<u16>>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.primitives.iter().map(Vec::len).sum()
    }

    /// Borrowed mesh with every semantic populated
    pub fn mesh(&self) -> Mesh<'_> {
        let mut mesh = Mesh::new("stacked_boxes");
        for indices in &self.primitives {
            mesh.add_primitive(Primitive::triangles(indices));
        }
        mesh.add_attribute(Semantic::Position, MeshAttribute::new("position", &self.positions, 3));
        mesh.add_attribute(Semantic::Normal, MeshAttribute::new("normal", &self.normals, 3));
        mesh.add_attribute(Semantic::TexCoord, MeshAttribute::new("texcoord0", &self.uvs, 2));
        mesh.add_attribute(Semantic::Weight, MeshAttribute::new("weights", &self.weights, 4));
        mesh.add_attribute(Semantic::Joint, MeshAttribute::new("joints", &self.joints, 4));
        mesh
    }
}

/// Create mesh data: 3 stacked boxes, each bound to its own bone
pub fn create_mesh_data() -> MeshData {
    let mut data = MeshData {
        positions: Vec::new(),
        normals: Vec::new(),
        uvs: Vec::new(),
        joints: Vec::new(),
        weights: Vec::new(),
        primitives: Vec::new(),
    };

    let half_w = 0.15;
    // (normal, tangent u, tangent v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    for seg in 0..SEGMENT_COUNT {
        let center_y = seg as f32 * SEGMENT_HEIGHT + SEGMENT_HEIGHT / 2.0;
        let base_vert = (seg * VERTS_PER_SEGMENT) as u16;
        let mut indices = Vec::with_capacity(36);

        for (face, (n, u, v)) in faces.iter().enumerate() {
            for (cu, cv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let extent = [half_w, SEGMENT_HEIGHT / 2.0, half_w];
                for axis in 0..3 {
                    let p = (n[axis] + cu * u[axis] + cv * v[axis]) * extent[axis];
                    data.positions
                        .push(if axis == 1 { p + center_y } else { p });
                }
                data.normals.extend_from_slice(n);
                data.uvs.extend_from_slice(&[(cu + 1.0) / 2.0, (cv + 1.0) / 2.0]);
                data.joints.extend_from_slice(&[seg as f32, 0.0, 0.0, 0.0]);
                data.weights.extend_from_slice(&[1.0, 0.0, 0.0, 0.0]);
            }
            let b = base_vert + face as u16 * 4;
            indices.extend_from_slice(&[b, b + 1, b + 2, b, b + 2, b + 3]);
        }

        data.primitives.push(indices);
    }

    data
}
