//! Compression settings (TOML)
//!
//! Every key is optional; an empty file yields the defaults.

use anyhow::{Context, Result};
use ovc_codec::{AxisMode, StreamType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Whether meshes and animation parameters go through the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionType {
    /// Write raw data, no payloads
    None,
    #[default]
    OpenVector,
}

/// Payload token encoding, recorded as `mode` in metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    Ascii,
    #[default]
    Binary,
}

impl EncodingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EncodingMode::Ascii => "ascii",
            EncodingMode::Binary => "binary",
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EncodingMode> for StreamType {
    fn from(mode: EncodingMode) -> Self {
        match mode {
            EncodingMode::Ascii => StreamType::Ascii,
            EncodingMode::Binary => StreamType::Binary,
        }
    }
}

/// How geometry bounds are computed across axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsMode {
    #[default]
    Separate,
    All,
}

impl From<BoundsMode> for AxisMode {
    fn from(mode: BoundsMode) -> Self {
        match mode {
            BoundsMode::Separate => AxisMode::SeparateDims,
            BoundsMode::All => AxisMode::AllDims,
        }
    }
}

/// Converter-wide compression settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Default: open-vector
    #[serde(default)]
    pub compression_type: CompressionType,

    /// Default: binary
    #[serde(default)]
    pub mode: EncodingMode,

    /// Default: separate (per-axis ranges). This differs from Open3DGC mesh
    /// encoders, which use all-dims bounds; set `all` for matching payloads.
    #[serde(default)]
    pub axis_mode: BoundsMode,

    /// Reject meshes whose per-vertex attributes disagree on element count.
    /// Default: false (mismatches are logged and encoded anyway)
    #[serde(default)]
    pub strict_vertex_counts: bool,

    /// Decode every geometry payload after writing and compare it to the source.
    /// Default: false
    #[serde(default)]
    pub verify_round_trip: bool,

    /// Directory for text dumps of every codec input face set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_dir: Option<PathBuf>,
}

impl CompressionSettings {
    /// Load settings from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse settings from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse compression settings")
    }

    pub fn compression_enabled(&self) -> bool {
        self.compression_type == CompressionType::OpenVector
    }
}
