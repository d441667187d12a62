//! Append-only output stream with length tracking
//!
//! Payload offsets are always the stream length read immediately before the
//! payload is written.

use std::io::{self, Write};

pub struct OutputStream<W: Write> {
    inner: W,
    len: u64,
}

impl<W: Write> OutputStream<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, len: 0 }
    }

    /// Bytes written so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `bytes`
    ///
    /// Every chunk the sink accepts is counted before an error is returned,
    /// so the length always matches the sink position.
    pub fn write_all(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            match self.inner.write(bytes) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole payload",
                    ));
                }
                Ok(n) => {
                    self.len += n as u64;
                    bytes = &bytes[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Append floats as little-endian IEEE-754
    pub fn write_f32s(&mut self, values: &[f32]) -> io::Result<()> {
        for v in values {
            self.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink unavailable"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_length_tracks_writes() {
        let mut stream = OutputStream::new(Vec::<u8>::new());
        assert!(stream.is_empty());
        stream.write_all(b"abc").unwrap();
        stream.write_f32s(&[1.0, 2.0]).unwrap();
        assert_eq!(stream.len(), 11);
        assert_eq!(stream.get_ref().len(), 11);
        assert_eq!(&stream.into_inner()[3..7], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_failed_write_keeps_length() {
        let mut stream = OutputStream::new(FailingSink);
        assert!(stream.write_all(b"abc").is_err());
        assert_eq!(stream.len(), 0);
    }

    /// Accepts `limit` bytes in total, then fails once
    struct ShortSink {
        written: Vec<u8>,
        limit: usize,
        failed: bool,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            if room == 0 && !self.failed {
                self.failed = true;
                return Err(io::Error::other("disk full"));
            }
            let n = if self.failed { buf.len() } else { buf.len().min(room) };
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_write_counts_accepted_bytes() {
        let mut stream = OutputStream::new(ShortSink {
            written: Vec::new(),
            limit: 3,
            failed: false,
        });
        assert!(stream.write_all(b"abcdef").is_err());
        assert_eq!(stream.len(), 3);

        let offset = stream.len();
        stream.write_all(b"XYZ").unwrap();
        let sink = stream.into_inner();
        assert_eq!(&sink.written[offset as usize..], b"XYZ");
        assert_eq!(sink.written, b"abcXYZ");
    }

    struct InterruptedOnce {
        written: Vec<u8>,
        interrupted: bool,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_interrupted_write_is_retried() {
        let mut stream = OutputStream::new(InterruptedOnce {
            written: Vec::new(),
            interrupted: false,
        });
        stream.write_all(b"abc").unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.into_inner().written, b"abc");
    }
}
