//! Token stream shared by the mesh and dynamic vector codecs
//!
//! Both stream types carry the same token sequence; only the byte encoding of
//! each token differs.

use crate::{unzigzag, zigzag, CodecError, StreamType};

/// Appends tokens to a payload buffer
pub struct StreamWriter {
    stream_type: StreamType,
    buf: Vec<u8>,
}

impl StreamWriter {
    /// Start a payload with `magic` and the stream type marker
    pub fn new(magic: &[u8; 4], stream_type: StreamType, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.max(8));
        buf.extend_from_slice(magic);
        buf.push(stream_type.marker());
        Self { stream_type, buf }
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn write_u64(&mut self, mut value: u64) {
        match self.stream_type {
            StreamType::Binary => loop {
                let byte = (value & 0x7f) as u8;
                value >>= 7;
                if value == 0 {
                    self.buf.push(byte);
                    break;
                }
                self.buf.push(byte | 0x80);
            },
            StreamType::Ascii => self.push_text(format_args!("{}", value)),
        }
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_u64(value as u64);
    }

    pub fn write_i64(&mut self, value: i64) {
        match self.stream_type {
            StreamType::Binary => self.write_u64(zigzag(value)),
            StreamType::Ascii => self.push_text(format_args!("{}", value)),
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        match self.stream_type {
            StreamType::Binary => self.buf.extend_from_slice(&value.to_le_bytes()),
            // Display for f32 prints the shortest text that parses back exactly
            StreamType::Ascii => self.push_text(format_args!("{}", value)),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn push_text(&mut self, args: core::fmt::Arguments<'_>) {
        use std::io::Write;
        // Writing into a Vec<u8> cannot fail
        let _ = self.buf.write_fmt(args);
        self.buf.push(b' ');
    }
}

/// Reads tokens back out of a payload
pub struct StreamReader<'a> {
    stream_type: StreamType,
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    /// Check `magic` and the stream marker, leaving the reader at the first token
    pub fn new(data: &'a [u8], magic: &[u8; 4]) -> Result<Self, CodecError> {
        if data.len() < 5 {
            return Err(CodecError::TruncatedData);
        }
        if &data[0..4] != magic {
            return Err(CodecError::InvalidMagic);
        }
        let stream_type = StreamType::from_marker(data[4])?;
        Ok(Self {
            stream_type,
            data,
            pos: 5,
        })
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        match self.stream_type {
            StreamType::Binary => {
                let mut value = 0u64;
                let mut shift = 0u32;
                loop {
                    let byte = *self.data.get(self.pos).ok_or(CodecError::TruncatedData)?;
                    self.pos += 1;
                    if shift >= 64 {
                        return Err(CodecError::MalformedToken);
                    }
                    value |= ((byte & 0x7f) as u64) << shift;
                    if byte & 0x80 == 0 {
                        return Ok(value);
                    }
                    shift += 7;
                }
            }
            StreamType::Ascii => self.next_token()?.parse().map_err(|_| CodecError::MalformedToken),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        u32::try_from(self.read_u64()?).map_err(|_| CodecError::MalformedToken)
    }

    pub fn read_usize(&mut self) -> Result<usize, CodecError> {
        usize::try_from(self.read_u64()?).map_err(|_| CodecError::MalformedToken)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        match self.stream_type {
            StreamType::Binary => Ok(unzigzag(self.read_u64()?)),
            StreamType::Ascii => self.next_token()?.parse().map_err(|_| CodecError::MalformedToken),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        match self.stream_type {
            StreamType::Binary => {
                let bytes = self
                    .data
                    .get(self.pos..self.pos + 4)
                    .ok_or(CodecError::TruncatedData)?;
                self.pos += 4;
                Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            StreamType::Ascii => self.next_token()?.parse().map_err(|_| CodecError::MalformedToken),
        }
    }

    fn next_token(&mut self) -> Result<&'a str, CodecError> {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(CodecError::TruncatedData);
        }
        std::str::from_utf8(&self.data[start..self.pos]).map_err(|_| CodecError::MalformedToken)
    }
}
