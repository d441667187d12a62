//! Compression metadata attached to extension trees
//!
//! ```text
//! "extensions": {
//!   "open-vector-compression": {
//!     "compressedData": {
//!       "verticesCount": 4,            // geometry only
//!       "indicesCount": 6,             // geometry only
//!       "mode": "binary",
//!       "count": 112,                  // payload byte length
//!       "type": 5121,                  // UNSIGNED_BYTE
//!       "byteOffset": 0,
//!       "floatAttributesIndexes": { "uv0": 0 }   // geometry only
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::settings::EncodingMode;

/// Extension key compression metadata is stored under
pub const EXTENSION_NAME: &str = "open-vector-compression";

const COMPRESSED_DATA: &str = "compressedData";

/// Location and layout of one compressed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices_count: Option<u32>,
    pub mode: EncodingMode,
    /// Payload length in bytes
    pub count: u32,
    /// Component type of the opaque payload
    #[serde(rename = "type")]
    pub component_type: u32,
    pub byte_offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_attributes_indexes: Option<BTreeMap<String, u32>>,
}

impl CompressedData {
    /// Payload byte range inside the shared stream
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        let start = self.byte_offset as usize;
        start..start + self.count as usize
    }

    /// Store under `extensions["open-vector-compression"]["compressedData"]`
    pub fn attach(&self, extensions: &mut Map<String, Value>) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(self)?;
        let extension = extensions
            .entry(EXTENSION_NAME)
            .or_insert_with(|| Value::Object(Map::new()));
        if !extension.is_object() {
            *extension = Value::Object(Map::new());
        }
        if let Value::Object(object) = extension {
            object.insert(COMPRESSED_DATA.to_string(), value);
        }
        Ok(())
    }

    /// Read back metadata previously stored with [`CompressedData::attach`]
    pub fn from_extensions(extensions: &Map<String, Value>) -> Option<Result<Self, serde_json::Error>> {
        let value = extensions.get(EXTENSION_NAME)?.get(COMPRESSED_DATA)?;
        Some(serde_json::from_value(value.clone()))
    }
}
