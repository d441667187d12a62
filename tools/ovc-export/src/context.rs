//! Converter context shared by every adapter call

use std::io::{self, Write};

use crate::profile::Profile;
use crate::settings::CompressionSettings;
use crate::stream::OutputStream;

/// Settings, profile and output streams for one conversion
pub struct ConverterContext<W: Write> {
    pub settings: CompressionSettings,
    pub profile: Profile,
    /// Receives every compressed payload (geometry and channels)
    pub compression_stream: OutputStream<W>,
    /// Receives raw animation parameters when compression is disabled
    pub animation_stream: OutputStream<W>,
    dump_counter: usize,
}

impl<W: Write> ConverterContext<W> {
    pub fn new(settings: CompressionSettings, compression_sink: W, animation_sink: W) -> Self {
        Self {
            settings,
            profile: Profile::default(),
            compression_stream: OutputStream::new(compression_sink),
            animation_stream: OutputStream::new(animation_sink),
            dump_counter: 0,
        }
    }

    /// Flush both sinks, compression stream first
    pub fn flush(&mut self) -> io::Result<()> {
        self.compression_stream.flush()?;
        self.animation_stream.flush()
    }

    pub(crate) fn next_dump_index(&mut self) -> usize {
        let index = self.dump_counter;
        self.dump_counter += 1;
        index
    }
}

impl ConverterContext<Vec<u8>> {
    /// Context writing into in-memory buffers
    pub fn in_memory(settings: CompressionSettings) -> Self {
        Self::new(settings, Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufWriter;

    #[test]
    fn test_flush_reaches_buffered_sinks() {
        let mut ctx = ConverterContext::new(
            CompressionSettings::default(),
            BufWriter::new(Vec::<u8>::new()),
            BufWriter::new(Vec::<u8>::new()),
        );
        ctx.compression_stream.write_all(b"payload").unwrap();
        ctx.animation_stream.write_f32s(&[1.0]).unwrap();
        assert!(ctx.compression_stream.get_ref().get_ref().is_empty());

        ctx.flush().unwrap();
        assert_eq!(ctx.compression_stream.get_ref().get_ref().as_slice(), b"payload");
        assert_eq!(ctx.animation_stream.get_ref().get_ref().len(), 4);
    }

    #[test]
    fn test_dump_index_counts_up() {
        let mut ctx = ConverterContext::in_memory(CompressionSettings::default());
        assert_eq!(ctx.next_dump_index(), 0);
        assert_eq!(ctx.next_dump_index(), 1);
    }
}
