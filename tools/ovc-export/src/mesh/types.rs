//! Mesh model consumed by the geometry adapter
//!
//! Attribute buffers and index lists are borrowed from the caller's asset
//! model; only identifiers and extension metadata are owned.

use hashbrown::HashMap;
use serde_json::{Map, Value};

/// Role of a vertex attribute stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord,
    Color,
    Weight,
    Joint,
}

impl Semantic {
    /// Fixed collection order
    pub const ALL: [Semantic; 6] = [
        Semantic::Position,
        Semantic::Normal,
        Semantic::TexCoord,
        Semantic::Color,
        Semantic::Weight,
        Semantic::Joint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::TexCoord => "TEXCOORD",
            Semantic::Color => "COLOR",
            Semantic::Weight => "WEIGHT",
            Semantic::Joint => "JOINT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Points => "POINTS",
            PrimitiveKind::Lines => "LINES",
            PrimitiveKind::LineLoop => "LINE_LOOP",
            PrimitiveKind::LineStrip => "LINE_STRIP",
            PrimitiveKind::Triangles => "TRIANGLES",
            PrimitiveKind::TriangleStrip => "TRIANGLE_STRIP",
            PrimitiveKind::TriangleFan => "TRIANGLE_FAN",
        }
    }
}

/// One material group of a mesh
#[derive(Debug, Clone, Copy)]
pub struct Primitive<'a> {
    pub kind: PrimitiveKind,
    pub indices: &'a [u16],
}

impl<'a> Primitive<'a> {
    pub fn triangles(indices: &'a [u16]) -> Self {
        Self {
            kind: PrimitiveKind::Triangles,
            indices,
        }
    }
}

/// A borrowed vertex attribute stream
#[derive(Debug, Clone)]
pub struct MeshAttribute<'a> {
    /// Identifier used to cross-reference the attribute in metadata
    pub id: String,
    /// `count * components` floats, tightly packed
    pub data: &'a [f32],
    pub count: usize,
    pub components: usize,
}

impl<'a> MeshAttribute<'a> {
    pub fn new(id: impl Into<String>, data: &'a [f32], components: usize) -> Self {
        let count = if components == 0 { 0 } else { data.len() / components };
        Self {
            id: id.into(),
            data,
            count,
            components,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh<'a> {
    pub id: String,
    pub primitives: Vec<Primitive<'a>>,
    attributes: HashMap<Semantic, Vec<MeshAttribute<'a>>>,
    /// Extension tree; compression metadata is attached here
    pub extensions: Map<String, Value>,
}

impl<'a> Mesh<'a> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn add_primitive(&mut self, primitive: Primitive<'a>) {
        self.primitives.push(primitive);
    }

    /// Append an attribute; insertion order is kept per semantic
    pub fn add_attribute(&mut self, semantic: Semantic, attribute: MeshAttribute<'a>) {
        self.attributes.entry(semantic).or_default().push(attribute);
    }

    pub fn attributes(&self, semantic: Semantic) -> &[MeshAttribute<'a>] {
        self.attributes
            .get(&semantic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn position(&self) -> Option<&MeshAttribute<'a>> {
        self.attributes(Semantic::Position).first()
    }
}
