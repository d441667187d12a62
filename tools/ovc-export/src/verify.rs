//! Round-trip verification of geometry payloads
//!
//! Decodes a payload into one contiguous region and compares the
//! reconstructed coordinates to the source position buffer. The per-axis
//! tolerance is the quantization step, `(max - min) / (2^q - 1)`, over the
//! bounds stored in the payload header.

use ovc_codec::{quant_max, MeshDecoder, MeshHeader, MeshTarget};
use tracing::{error, info, warn};

use crate::error::{scratch, CompressionError};
use crate::mesh::Mesh;

/// Decoded geometry backed by a single `u32` word region
///
/// Layout: indices (two per word, padded to a whole word), coordinates,
/// normals, then the first float attribute.
#[derive(Debug)]
pub struct DecodedGeometry {
    header: MeshHeader,
    region: Vec<u32>,
    index_words: usize,
    coord_len: usize,
    normal_len: usize,
    float_len: usize,
}

impl DecodedGeometry {
    pub fn decode(payload: &[u8]) -> Result<Self, CompressionError> {
        let decoder = MeshDecoder::new(payload)?;
        let header = decoder.header().clone();

        let index_count = header.index_count();
        let index_words = index_count.div_ceil(2);
        let coord_len = header.coord.as_ref().map(|s| s.len()).unwrap_or(0);
        let normal_len = header.normal.as_ref().map(|s| s.len()).unwrap_or(0);
        let float_len = header
            .float_attributes
            .first()
            .map(|a| a.slot.len())
            .unwrap_or(0);

        let total = index_words + coord_len + normal_len + float_len;
        let mut region: Vec<u32> = scratch("decode region", total)?;
        region.resize(total, 0);

        {
            let (index_region, rest) = region.split_at_mut(index_words);
            let (coord_region, rest) = rest.split_at_mut(coord_len);
            let (normal_region, float_region) = rest.split_at_mut(normal_len);

            let indices: &mut [u16] = bytemuck::cast_slice_mut(index_region);
            let mut target = MeshTarget::new(&mut indices[..index_count]);
            if coord_len > 0 {
                target.coord = Some(bytemuck::cast_slice_mut(coord_region));
            }
            if normal_len > 0 {
                target.normal = Some(bytemuck::cast_slice_mut(normal_region));
            }
            if float_len > 0 {
                target.float_attributes.push(Some(bytemuck::cast_slice_mut(float_region)));
            }
            decoder.decode_payload(&mut target)?;
        }

        Ok(Self {
            header,
            region,
            index_words,
            coord_len,
            normal_len,
            float_len,
        })
    }

    pub fn header(&self) -> &MeshHeader {
        &self.header
    }

    pub fn indices(&self) -> &[u16] {
        let indices: &[u16] = bytemuck::cast_slice(&self.region[..self.index_words]);
        &indices[..self.header.index_count()]
    }

    pub fn coords(&self) -> &[f32] {
        let start = self.index_words;
        bytemuck::cast_slice(&self.region[start..start + self.coord_len])
    }

    pub fn normals(&self) -> &[f32] {
        let start = self.index_words + self.coord_len;
        bytemuck::cast_slice(&self.region[start..start + self.normal_len])
    }

    pub fn first_float_attribute(&self) -> &[f32] {
        let start = self.index_words + self.coord_len + self.normal_len;
        bytemuck::cast_slice(&self.region[start..start + self.float_len])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// Every coordinate is within tolerance
    Passed,
    /// Some coordinates exceed the tolerance
    ToleranceExceeded,
    /// Decoded and source vertex counts differ; nothing was compared
    VertexCountMismatch { source: usize, decoded: usize },
    /// The mesh has no position attribute to compare against
    NoPositions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub outcome: VerifyOutcome,
    pub vertex_count: usize,
    /// Allowed absolute error per axis
    pub tolerance: Vec<f32>,
    /// Largest observed absolute error per axis
    pub max_error: Vec<f32>,
    /// Number of components outside tolerance
    pub violations: usize,
}

impl VerificationReport {
    fn empty(outcome: VerifyOutcome) -> Self {
        Self {
            outcome,
            vertex_count: 0,
            tolerance: Vec::new(),
            max_error: Vec::new(),
            violations: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == VerifyOutcome::Passed
    }
}

/// Decode `payload` and compare its coordinates with the mesh positions
///
/// Mismatches are reported and logged; only decode failures are errors.
pub fn verify_geometry(mesh: &Mesh<'_>, payload: &[u8]) -> Result<VerificationReport, CompressionError> {
    let decoded = DecodedGeometry::decode(payload)?;

    let Some(position) = mesh.position() else {
        warn!("Mesh '{}': no positions to verify", mesh.id);
        return Ok(VerificationReport::empty(VerifyOutcome::NoPositions));
    };

    let decoded_count = decoded.header().coord_count();
    if decoded_count != position.count {
        error!(
            "Mesh '{}': vertex count does not match (source {}, decoded {})",
            mesh.id, position.count, decoded_count
        );
        return Ok(VerificationReport::empty(VerifyOutcome::VertexCountMismatch {
            source: position.count,
            decoded: decoded_count,
        }));
    }

    let dim = position.components;
    // Bounds the codec quantized against, so all-dims payloads get the shared range
    let mut tolerance: Vec<f32> = match decoded.header().coord.as_ref() {
        Some(coord) => coord
            .min
            .iter()
            .zip(&coord.max)
            .map(|(lo, hi)| (hi - lo) / quant_max(coord.quant_bits) as f32)
            .collect(),
        None => Vec::new(),
    };
    tolerance.resize(dim, 0.0);

    let mut max_error = vec![0.0f32; dim];
    let mut violations = 0;
    let coords = decoded.coords();
    for (i, (source, out)) in position.data.iter().zip(coords).enumerate() {
        let d = i % dim;
        let err = (source - out).abs();
        max_error[d] = max_error[d].max(err);
        if err > tolerance[d] {
            violations += 1;
        }
    }

    let outcome = if violations == 0 {
        info!(
            "Mesh '{}': round trip ok, {} vertices, max error {:?}",
            mesh.id, position.count, max_error
        );
        VerifyOutcome::Passed
    } else {
        error!(
            "Mesh '{}': {} components outside tolerance {:?} (max error {:?})",
            mesh.id, violations, tolerance, max_error
        );
        VerifyOutcome::ToleranceExceeded
    };

    Ok(VerificationReport {
        outcome,
        vertex_count: position.count,
        tolerance,
        max_error,
        violations,
    })
}
