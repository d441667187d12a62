//! Animation channel compression
//!
//! Each animation parameter is a dense array of fixed-width keyframe vectors.
//! Compressed parameters go to the shared compression stream; uncompressed
//! ones are written raw to the animation stream.

use std::collections::BTreeMap;
use std::io::Write;

use ovc_codec::{encode_dynamic_vector, DynamicVector, VectorEncodeParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::context::ConverterContext;
use crate::error::{to_u32, CompressionError};
use crate::formats::CompressedData;
use crate::profile::UNSIGNED_BYTE;
use crate::settings::EncodingMode;
use crate::stream::OutputStream;

/// Quantization bits for single-component (time) channels
pub const TIME_QUANT_BITS: u32 = 11;

/// Quantization bits for every other channel
pub const VECTOR_QUANT_BITS: u32 = 17;

/// Bit depth for a channel, chosen from its component count only
pub fn channel_quant_bits(components: usize) -> u32 {
    if components == 1 {
        TIME_QUANT_BITS
    } else {
        VECTOR_QUANT_BITS
    }
}

/// Byte range of one payload inside a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadRange {
    pub byte_offset: u32,
    pub byte_length: u32,
}

/// Compress `count` vectors of `components` floats and append them to `stream`
pub fn encode_channel<W: Write>(
    buffer: &[f32],
    components: usize,
    count: usize,
    mode: EncodingMode,
    stream: &mut OutputStream<W>,
) -> Result<PayloadRange, CompressionError> {
    if components == 0 {
        return Err(CompressionError::ZeroComponents);
    }
    let expected = components * count;
    if buffer.len() < expected {
        return Err(CompressionError::ChannelBufferTooSmall {
            expected,
            actual: buffer.len(),
        });
    }

    let quant_bits = channel_quant_bits(components);
    let payload = encode_dynamic_vector(
        &DynamicVector::packed(buffer, count, components),
        &VectorEncodeParams::new(quant_bits, mode.into()),
    )?;

    let offset = stream.len();
    let byte_offset = to_u32(offset)?;
    let byte_length = to_u32(payload.len() as u64)?;
    to_u32(offset + payload.len() as u64)?;
    stream.write_all(&payload)?;

    debug!(
        "Channel: {} x {} components at {} bits -> {} bytes at offset {}",
        count, components, quant_bits, byte_length, byte_offset
    );

    Ok(PayloadRange {
        byte_offset,
        byte_length,
    })
}

/// Sampler linking a parameter to the animation's time input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampler {
    pub input: String,
    pub interpolation: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationParameter {
    pub id: String,
    pub type_name: String,
    pub count: usize,
    /// Offset in whichever stream the parameter was written to
    pub byte_offset: u64,
    pub extensions: Map<String, Value>,
}

impl AnimationParameter {
    pub fn compressed_data(&self) -> Option<Result<CompressedData, serde_json::Error>> {
        CompressedData::from_extensions(&self.extensions)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub id: String,
    /// Keyframe count shared by every parameter
    pub count: usize,
    pub parameters: Vec<AnimationParameter>,
    pub samplers: BTreeMap<String, Sampler>,
}

impl Animation {
    pub fn new(id: impl Into<String>, count: usize) -> Self {
        Self {
            id: id.into(),
            count,
            parameters: Vec::new(),
            samplers: BTreeMap::new(),
        }
    }

    pub fn sampler_id(&self, parameter: &str) -> String {
        format!("{}_{}_sampler", self.id, parameter)
    }

    pub fn parameter(&self, id: &str) -> Option<&AnimationParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

/// Register parameter `sid` on `animation` and write its data
///
/// With compression enabled the parameter is compressed into the compression
/// stream and `compressedData` is attached to its extensions; a type the
/// profile does not know is logged and nothing is written. Otherwise the raw
/// floats go to the animation stream.
pub fn write_animation_parameter<W: Write>(
    animation: &mut Animation,
    sid: &str,
    type_name: &str,
    buffer: &[f32],
    ctx: &mut ConverterContext<W>,
) -> Result<(), CompressionError> {
    let compress = ctx.settings.compression_enabled();

    let mut parameter = AnimationParameter {
        id: sid.to_string(),
        type_name: type_name.to_string(),
        count: animation.count,
        byte_offset: 0,
        extensions: Map::new(),
    };
    let sampler_id = animation.sampler_id(sid);
    animation.samplers.insert(
        sampler_id,
        Sampler {
            input: "TIME".to_string(),
            interpolation: "LINEAR".to_string(),
            output: sid.to_string(),
        },
    );

    let stream = if compress {
        &mut ctx.compression_stream
    } else {
        &mut ctx.animation_stream
    };
    parameter.byte_offset = stream.len();

    if compress {
        let components = ctx.profile.components_for_name(type_name);
        if components == 0 {
            warn!(
                "Animation '{}': parameter '{}' has unknown type {}, not written",
                animation.id, sid, type_name
            );
        } else {
            let mode = ctx.settings.mode;
            let range = encode_channel(buffer, components, animation.count, mode, stream)?;
            info!(
                "Animation '{}': parameter '{}' -> {} bytes at offset {}",
                animation.id, sid, range.byte_length, range.byte_offset
            );
            CompressedData {
                vertices_count: None,
                indices_count: None,
                mode,
                count: range.byte_length,
                component_type: UNSIGNED_BYTE,
                byte_offset: range.byte_offset,
                float_attributes_indexes: None,
            }
            .attach(&mut parameter.extensions)?;
        }
    } else {
        stream.write_f32s(buffer)?;
    }

    animation.parameters.push(parameter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompressionSettings, CompressionType};

    #[test]
    fn test_channel_quant_bits() {
        assert_eq!(channel_quant_bits(1), 11);
        assert_eq!(channel_quant_bits(3), 17);
        assert_eq!(channel_quant_bits(4), 17);
        assert_eq!(channel_quant_bits(16), 17);
    }

    #[test]
    fn test_encode_channel_rejects_zero_components() {
        let mut stream = OutputStream::new(Vec::<u8>::new());
        let err = encode_channel(&[1.0], 0, 1, EncodingMode::Binary, &mut stream).unwrap_err();
        assert!(matches!(err, CompressionError::ZeroComponents));
        assert!(stream.is_empty());
    }

    #[test]
    fn test_encode_channel_rejects_short_buffer() {
        let mut stream = OutputStream::new(Vec::<u8>::new());
        let err = encode_channel(&[1.0; 5], 3, 2, EncodingMode::Binary, &mut stream).unwrap_err();
        assert!(matches!(
            err,
            CompressionError::ChannelBufferTooSmall {
                expected: 6,
                actual: 5
            }
        ));
        assert!(stream.is_empty());
    }

    #[test]
    fn test_parameter_is_compressed_with_sampler() {
        let mut ctx = ConverterContext::in_memory(CompressionSettings::default());
        let mut animation = Animation::new("walk", 3);
        let translations = [0.0f32, 0.0, 0.0, 1.0, 0.5, 0.0, 2.0, 1.0, 0.0];

        write_animation_parameter(&mut animation, "translation", "FLOAT_VEC3", &translations, &mut ctx)
            .unwrap();

        let sampler = &animation.samplers["walk_translation_sampler"];
        assert_eq!(sampler.input, "TIME");
        assert_eq!(sampler.interpolation, "LINEAR");
        assert_eq!(sampler.output, "translation");

        let parameter = animation.parameter("translation").unwrap();
        assert_eq!(parameter.count, 3);
        assert_eq!(parameter.type_name, "FLOAT_VEC3");
        assert_eq!(parameter.byte_offset, 0);

        let data = parameter.compressed_data().unwrap().unwrap();
        assert_eq!(data.byte_offset, 0);
        assert_eq!(data.count as u64, ctx.compression_stream.len());
        assert_eq!(data.component_type, 5121);
        assert_eq!(data.vertices_count, None);
        assert!(ctx.animation_stream.is_empty());
    }

    #[test]
    fn test_unknown_type_writes_nothing() {
        let mut ctx = ConverterContext::in_memory(CompressionSettings::default());
        let mut animation = Animation::new("walk", 2);
        write_animation_parameter(&mut animation, "weird", "DOUBLE", &[1.0, 2.0], &mut ctx).unwrap();

        let parameter = animation.parameter("weird").unwrap();
        assert!(parameter.compressed_data().is_none());
        assert!(ctx.compression_stream.is_empty());
        assert_eq!(animation.samplers.len(), 1);
    }

    #[test]
    fn test_uncompressed_parameter_goes_to_animation_stream() {
        let settings = CompressionSettings {
            compression_type: CompressionType::None,
            ..Default::default()
        };
        let mut ctx = ConverterContext::in_memory(settings);
        let mut animation = Animation::new("walk", 2);
        write_animation_parameter(&mut animation, "TIME", "FLOAT", &[0.0, 0.5], &mut ctx).unwrap();
        write_animation_parameter(&mut animation, "scale", "FLOAT", &[1.0, 2.0], &mut ctx).unwrap();

        assert!(ctx.compression_stream.is_empty());
        assert_eq!(ctx.animation_stream.len(), 16);
        assert_eq!(animation.parameter("scale").unwrap().byte_offset, 8);
        assert!(animation.parameter("scale").unwrap().extensions.is_empty());
        let raw = ctx.animation_stream.into_inner();
        assert_eq!(&raw[4..8], &0.5f32.to_le_bytes());
    }
}
