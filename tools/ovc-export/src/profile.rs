//! Component type profile
//!
//! Resolves type names used by animation parameters and metadata to their
//! numeric component-type codes, and codes to component counts.

use hashbrown::HashMap;

pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const FLOAT: u32 = 5126;
pub const FLOAT_VEC2: u32 = 35664;
pub const FLOAT_VEC3: u32 = 35665;
pub const FLOAT_VEC4: u32 = 35666;
pub const FLOAT_MAT4: u32 = 35676;

/// (name, code, components)
const TYPES: [(&str, u32, usize); 7] = [
    ("UNSIGNED_BYTE", UNSIGNED_BYTE, 1),
    ("UNSIGNED_SHORT", UNSIGNED_SHORT, 1),
    ("FLOAT", FLOAT, 1),
    ("FLOAT_VEC2", FLOAT_VEC2, 2),
    ("FLOAT_VEC3", FLOAT_VEC3, 3),
    ("FLOAT_VEC4", FLOAT_VEC4, 4),
    ("FLOAT_MAT4", FLOAT_MAT4, 16),
];

#[derive(Debug, Clone)]
pub struct Profile {
    codes: HashMap<&'static str, u32>,
    components: HashMap<u32, usize>,
}

impl Default for Profile {
    fn default() -> Self {
        let mut codes = HashMap::with_capacity(TYPES.len());
        let mut components = HashMap::with_capacity(TYPES.len());
        for (name, code, count) in TYPES {
            codes.insert(name, code);
            components.insert(code, count);
        }
        Self { codes, components }
    }
}

impl Profile {
    pub fn type_code(&self, name: &str) -> Option<u32> {
        self.codes.get(name).copied()
    }

    /// Component count for a type code, 0 when unknown
    pub fn components_for_type(&self, code: u32) -> usize {
        self.components.get(&code).copied().unwrap_or(0)
    }

    /// Component count for a type name, 0 when unknown
    pub fn components_for_name(&self, name: &str) -> usize {
        self.type_code(name)
            .map(|code| self.components_for_type(code))
            .unwrap_or(0)
    }
}
